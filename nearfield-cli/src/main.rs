//! Nearfield CLI - Command-line interface
//!
//! This binary exercises the Nearfield library against a live artifact API
//! (or the built-in Seattle demo catalog).

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::check::CheckArgs;
use commands::config::ConfigCommands;
use commands::distance::DistanceArgs;
use commands::nearby::NearbyArgs;
use commands::session::SessionArgs;

#[derive(Parser)]
#[command(name = "nearfield")]
#[command(version = nearfield::VERSION)]
#[command(about = "Discover nearby AR artifacts and check proximity gates", long_about = None)]
struct Cli {
    /// Enable debug-level logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Also print log events to stdout
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance between two points
    Distance(DistanceArgs),

    /// List artifacts near a point with their visibility state
    Nearby(NearbyArgs),

    /// Check whether one artifact may be opened in AR from a position
    Check(CheckArgs),

    /// Run the proximity engine, reading events from stdin
    Session(SessionArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Distance(args) => commands::distance::run(args),
        Commands::Config(command) => commands::config::run(command),
        Commands::Nearby(args) => match runner::CliRunner::new(cli.debug, cli.verbose) {
            Ok(runner) => commands::nearby::run(&runner, args).await,
            Err(e) => Err(e),
        },
        Commands::Check(args) => match runner::CliRunner::new(cli.debug, cli.verbose) {
            Ok(runner) => commands::check::run(&runner, args).await,
            Err(e) => Err(e),
        },
        Commands::Session(args) => match runner::CliRunner::new(cli.debug, cli.verbose) {
            Ok(runner) => commands::session::run(&runner, args).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nearby() {
        let cli = Cli::try_parse_from([
            "nearfield",
            "nearby",
            "--lat",
            "47.6205",
            "--lon=-122.3493",
            "--types",
            "art,menu",
            "--pages",
            "2",
            "--demo",
        ])
        .unwrap();

        match cli.command {
            Commands::Nearby(args) => {
                assert_eq!(args.lat, 47.6205);
                assert_eq!(args.lon, -122.3493);
                assert_eq!(args.types.as_deref(), Some("art,menu"));
                assert_eq!(args.pages, 2);
                assert!(args.demo);
            }
            _ => panic!("Expected nearby"),
        }
    }

    #[test]
    fn test_user_position_requires_both_coordinates() {
        let result = Cli::try_parse_from([
            "nearfield",
            "nearby",
            "--lat",
            "47.6",
            "--lon=-122.3",
            "--user-lat",
            "47.6",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["nearfield", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Path)));
    }

    #[test]
    fn test_global_debug_flag() {
        let cli = Cli::try_parse_from(["nearfield", "session", "--demo", "--debug"]).unwrap();
        assert!(cli.debug);
    }
}
