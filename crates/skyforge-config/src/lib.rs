//! Configuration for the Skyforge converter.
//!
//! Settings persist to disk as a RON file and can be overridden per run from
//! the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, InputConfig, OutputConfig, default_config_dir};
pub use error::ConfigError;
