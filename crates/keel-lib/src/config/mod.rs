//! Global configuration management
//!
//! One settings document per configuration directory, persisted as
//! `config.yaml`, with per-read environment overrides, schema version
//! migration and a lazily connected backend store.
//!
//! Precedence for a single read: `KEEL_<FIELD>` (if it parses) -> stored value.

pub mod codec;
pub mod env;
pub mod global;
pub mod instance;
pub mod migration;
pub mod settings;
pub mod store_config;

pub use env::{EnvSource, MapEnv, ProcessEnv, resolve_settings};
pub use global::{ConfigContext, GlobalConfig};
pub use instance::SharedGlobalConfig;
pub use migration::MigrationOutcome;
pub use settings::{GlobalSettings, SettingsOverrides, parse_version};
pub use store_config::{StoreConfig, StoreType};

/// Application name used for the OS-specific configuration directory
pub const APP_NAME: &str = "keel";

/// Prefix of the per-field override variables (`KEEL_USER_EMAIL`, ...)
pub const ENV_PREFIX: &str = "KEEL_";

/// Prefix of the variables that fully determine the default store
pub const STORE_ENV_PREFIX: &str = "KEEL_STORE_";

/// Relocates the default configuration directory
pub const CONFIG_PATH_ENV: &str = "KEEL_CONFIG_PATH";

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const LOCAL_STORES_DIRECTORY_NAME: &str = "local_stores";
pub const DEFAULT_STORE_DIRECTORY_NAME: &str = "default_store";

/// Version of the running application, compared against `schema_version`
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
