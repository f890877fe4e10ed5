//! # keel Library
//!
//! Process-wide global configuration for keel: settings persisted to
//! `config.yaml`, environment overrides, schema migration and the backend
//! store connection derived from the stored store configuration.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Foundation types and error enums
//! - [`logger`] - Structured logging setup
//! - [`config`] - Settings, overrides, migration and the `GlobalConfig` singleton
//! - [`store`] - Backend store trait, registry and the local file store
//! - [`analytics`] - Analytics sink used by the configuration
//! - [`application`] - CLI interface and command handlers
//!
//! ## Quick Start
//!
//! ```no_run
//! use keel_lib::config::{GlobalConfig, instance::lock};
//!
//! let shared = GlobalConfig::instance().unwrap();
//! let mut config = lock(&shared);
//! let store = config.zen_store().unwrap();
//! println!("connected to {}", store.config().url);
//! ```

pub mod analytics;
pub mod application;
pub mod config;
pub mod display;
pub mod logger;
pub mod primitives;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use application::{AppConfig, Cli, Commands, execute_command};
pub use config::{ConfigContext, GlobalConfig, GlobalSettings, StoreConfig, StoreType};
pub use logger::Logger;
pub use primitives::{ConfigError, LogFormat, LogLevel, LogOutput, LoggerError, StoreError};
pub use store::{StoreBackend, StoreRegistry};

use anyhow::Result;
use application::{CliConfig, ENV_FILES, load_env_files};

pub fn main() -> Result<()> {
    load_env_files(&ENV_FILES)?;

    let config = CliConfig::load()?;

    execute_command(config)
}
