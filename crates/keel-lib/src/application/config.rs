//! CLI process configuration
//!
//! Settings for the `keel` process itself (logging), as opposed to the
//! persisted global configuration. Precedence: defaults -> .env -> env
//! vars -> CLI args.

use crate::primitives::*;
use clap::Parser;
use serde::Deserialize;

/// Environment variable holding the CLI log level
pub const LOGGING_VERBOSITY_ENV: &str = "KEEL_LOGGING_VERBOSITY";

/// Default configuration values
pub mod defaults {
    pub const LOG_LEVEL: &str = "warn";
    pub const LOG_FORMAT: &str = "text";
    pub const LOG_OUTPUT: &str = "stderr";
}

mod default_fns {
    use super::*;

    pub fn log_level() -> LogLevel {
        LogLevel::Warning
    }

    pub fn log_format() -> LogFormat {
        LogFormat::Text
    }

    pub fn log_output() -> LogOutput {
        LogOutput::Stderr
    }
}

#[derive(Debug, Clone, Parser, Deserialize)]
pub struct AppConfig {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = LOGGING_VERBOSITY_ENV, default_value = defaults::LOG_LEVEL, ignore_case = true)]
    #[serde(default = "default_fns::log_level")]
    pub log_level: LogLevel,

    /// Log format (text, json, yaml)
    #[arg(long, env = "KEEL_LOG_FORMAT", default_value = defaults::LOG_FORMAT)]
    #[serde(default = "default_fns::log_format")]
    pub log_format: LogFormat,

    /// Log output stream (stderr, stdout)
    #[arg(long, env = "KEEL_LOG_OUTPUT", default_value = defaults::LOG_OUTPUT)]
    #[serde(default = "default_fns::log_output")]
    pub log_output: LogOutput,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_fns::log_level(),
            log_format: default_fns::log_format(),
            log_output: default_fns::log_output(),
        }
    }
}

impl AppConfig {
    pub fn to_logger_config(&self) -> LoggerConfig {
        let ansi = match self.log_output {
            LogOutput::Stderr => console::colors_enabled_stderr(),
            LogOutput::Stdout => console::colors_enabled(),
        };
        LoggerConfig {
            level: self.log_level,
            format: self.log_format,
            output: self.log_output,
            ansi,
        }
    }

    /// Merge this config with another, taking non-default values from other
    pub fn merge_with(mut self, other: Self) -> Self {
        if other.log_level != default_fns::log_level() {
            self.log_level = other.log_level;
        }
        if !matches!(other.log_format, LogFormat::Text) {
            self.log_format = other.log_format;
        }
        if !matches!(other.log_output, LogOutput::Stderr) {
            self.log_output = other.log_output;
        }
        self
    }
}
