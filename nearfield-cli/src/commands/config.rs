//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use nearfield::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;

    if !path.exists() {
        println!("; {} not found, showing defaults", path.display());
    }
    for (key, value) in entries(&config) {
        println!("{} = {}", key, value);
    }
    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Flattened `section.key = value` view of the configuration.
fn entries(config: &ConfigFile) -> Vec<(&'static str, String)> {
    vec![
        ("api.base_url", config.api.base_url.clone()),
        ("api.timeout_secs", config.api.timeout_secs.to_string()),
        (
            "api.token",
            if config.api.token.is_some() {
                "(set)".to_string()
            } else {
                "(not set)".to_string()
            },
        ),
        ("query.default_radius_m", config.query.default_radius_m.to_string()),
        ("query.page_limit", config.query.page_limit.to_string()),
        ("query.center_precision", config.query.center_precision.to_string()),
        (
            "scheduler.recency_window_secs",
            config.scheduler.recency_window_secs.to_string(),
        ),
        ("position.accuracy", config.position.accuracy.as_str().to_string()),
        ("position.timeout_secs", config.position.timeout_secs.to_string()),
        (
            "position.fallback",
            config.position.fallback.to_string(),
        ),
        ("logging.file", config.logging.file.display().to_string()),
    ]
}
