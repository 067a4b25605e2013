//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use nearfield::config::ConfigFileError;
use nearfield::engine::EngineError;
use nearfield::repository::FetchError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Bad command-line input
    InvalidArgument(String),
    /// Artifact API request failed
    Fetch(FetchError),
    /// Proximity engine failed or stopped
    Engine(EngineError),
    /// Reading input failed
    Io(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Fetch(FetchError::AuthRequired(_)) => {
                eprintln!();
                eprintln!("The artifact API requires a bearer token:");
                eprintln!("  1. Sign in to the AR Map Explorer backend and copy your token");
                eprintln!("  2. Set 'token' in the [api] section of the config file");
                eprintln!("     (see: nearfield config path)");
            }
            CliError::Fetch(FetchError::Network(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The API server is not running");
                eprintln!("  2. 'base_url' in the [api] section points at the wrong host");
                eprintln!("  3. Try --demo to use the built-in Seattle catalog");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Fetch(e) => write!(f, "Artifact request failed: {}", e),
            CliError::Engine(e) => write!(f, "Engine error: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
