use crate::primitives::ConfigError;
use clap::{Parser, Subcommand};

use super::config::AppConfig;

/// keel CLI - global configuration manager
#[derive(Debug, Clone, Parser)]
#[command(name = "keel")]
#[command(about = "Manage the keel global configuration")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration loaded from CLI
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Option<Commands>,
}

impl CliConfig {
    /// Load configuration from command line arguments
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::from(Cli::parse()))
    }

    /// Parse an explicit argument list
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from)
    }
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            app_config: cli.config,
            command: cli.command,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Analytics for opt-in and opt-out
    Analytics {
        #[command(subcommand)]
        action: AnalyticsCommand,
    },

    /// Configuration of logging
    Logging {
        #[command(subcommand)]
        action: LoggingCommand,
    },

    /// Inspect and change the global store configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AnalyticsCommand {
    /// Show whether analytics are enabled
    Get,
    /// Allow keel to collect anonymous usage analytics
    OptIn,
    /// Stop keel from collecting usage analytics
    OptOut,
}

#[derive(Debug, Clone, Subcommand)]
pub enum LoggingCommand {
    /// Set the log level for keel commands
    SetVerbosity {
        #[arg(help = "One of ERROR, WARN, INFO, DEBUG, TRACE")]
        verbosity: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Show the global configuration and the active selection
    Describe,

    /// Explain where configuration comes from
    Explain,

    /// Change the store used by the global configuration
    Set {
        /// Store URL; the store type is inferred from the scheme
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Project to activate after connecting
        #[arg(long)]
        project: Option<String>,

        /// Revert to the default local store
        #[arg(long, conflicts_with_all = ["url", "username", "password"])]
        local_store: bool,
    },
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
