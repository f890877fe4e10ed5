//! Process-wide `GlobalConfig` instance
//!
//! At most one instance exists at a time. It is created on first request
//! from the default configuration directory and can be swapped or cleared
//! with `reset_instance`.

use crate::config::global::{ConfigContext, GlobalConfig};
use crate::config::settings::SettingsOverrides;
use crate::primitives::ConfigError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to the process-wide configuration
pub type SharedGlobalConfig = Arc<Mutex<GlobalConfig>>;

static GLOBAL_CONFIG: Mutex<Option<SharedGlobalConfig>> = Mutex::new(None);

fn holder() -> MutexGuard<'static, Option<SharedGlobalConfig>> {
    GLOBAL_CONFIG.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GlobalConfig {
    /// The process-wide instance, created with default collaborators
    pub fn instance() -> Result<SharedGlobalConfig, ConfigError> {
        Self::instance_with(ConfigContext::default())
    }

    /// The process-wide instance, created with `context` if none exists
    ///
    /// A new instance is loaded from the default configuration directory,
    /// migrated, and connected to the default store when no store is
    /// configured. An existing instance is returned as is.
    pub fn instance_with(context: ConfigContext) -> Result<SharedGlobalConfig, ConfigError> {
        let mut slot = holder();
        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let config_dir = context.default_config_directory()?;
        let mut config = GlobalConfig::load(config_dir, SettingsOverrides::default(), context)?;
        config.migrate()?;
        if config.store_config().is_none() {
            config.set_default_store()?;
        }

        let shared = Arc::new(Mutex::new(config));
        *slot = Some(Arc::clone(&shared));
        Ok(shared)
    }

    /// The current instance, without creating one
    pub fn get_instance() -> Option<SharedGlobalConfig> {
        holder().clone()
    }

    /// Replace the current instance, or clear it with `None`
    ///
    /// Handles obtained earlier keep pointing at the old instance.
    pub fn reset_instance(config: Option<GlobalConfig>) {
        *holder() = config.map(|c| Arc::new(Mutex::new(c)));
    }
}

/// Lock a shared configuration, recovering from a poisoned lock
pub fn lock(shared: &SharedGlobalConfig) -> MutexGuard<'_, GlobalConfig> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
