//! Configuration file handling for `~/.nearfield/config.ini`.
//!
//! # Example
//!
//! ```no_run
//! use nearfield::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let client_config = config.client_config();
//! let scheduler_config = config.scheduler_config();
//! # Ok::<(), nearfield::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::*;
