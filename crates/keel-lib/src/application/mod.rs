//! Application layer modules
//!
//! CLI definition, process configuration and command handlers.

pub mod cli;
pub mod commands;
pub mod config;
pub mod loader;

pub use cli::{Cli, CliConfig, Commands};
pub use commands::{execute_command, execute_command_with_config};
pub use config::AppConfig;
pub use loader::*;
