//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`check`] - Single-artifact AR gate
//! - [`config`] - Configuration management (path, show, init)
//! - [`distance`] - Great-circle distance between two points
//! - [`nearby`] - Nearby query with derived visibility
//! - [`session`] - Interactive proximity engine session

pub mod check;
pub mod common;
pub mod config;
pub mod distance;
pub mod nearby;
pub mod session;
