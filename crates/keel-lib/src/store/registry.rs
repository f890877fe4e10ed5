use crate::config::store_config::{StoreConfig, StoreType};
use crate::primitives::StoreError;
use crate::store::StoreBackend;
use crate::store::local::LocalStoreFactory;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Builds stores of one kind
pub trait StoreFactory: Send + Sync {
    fn create(
        &self,
        config: &StoreConfig,
        skip_default_registrations: bool,
    ) -> Result<Box<dyn StoreBackend>, StoreError>;

    /// Copy the store's on-disk state under `config_path`
    ///
    /// Returns the configuration for the copy, pointing at
    /// `load_config_path` when given. Remote kinds have nothing to copy.
    fn copy_local_store(
        &self,
        config: &StoreConfig,
        _config_path: &Path,
        _load_config_path: Option<&Path>,
    ) -> Result<StoreConfig, StoreError> {
        Ok(config.clone())
    }
}

/// Store kind -> factory
#[derive(Clone, Default)]
pub struct StoreRegistry {
    factories: BTreeMap<StoreType, Arc<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in local store
    pub fn with_defaults() -> Self {
        Self::new().with(StoreType::Local, LocalStoreFactory)
    }

    pub fn with(mut self, store_type: StoreType, factory: impl StoreFactory + 'static) -> Self {
        self.register(store_type, Arc::new(factory));
        self
    }

    /// Register a factory, returning the one it replaces
    pub fn register(
        &mut self,
        store_type: StoreType,
        factory: Arc<dyn StoreFactory>,
    ) -> Option<Arc<dyn StoreFactory>> {
        self.factories.insert(store_type, factory)
    }

    pub fn registered(&self) -> Vec<StoreType> {
        self.factories.keys().copied().collect()
    }

    pub fn factory(&self, store_type: StoreType) -> Result<&Arc<dyn StoreFactory>, StoreError> {
        self.factories
            .get(&store_type)
            .ok_or_else(|| StoreError::UnsupportedStoreType {
                store_type: store_type.to_string(),
                registered: self.registered().iter().map(|t| t.to_string()).collect(),
            })
    }

    pub fn create_store(
        &self,
        config: &StoreConfig,
        skip_default_registrations: bool,
    ) -> Result<Box<dyn StoreBackend>, StoreError> {
        tracing::debug!(
            store_type = %config.store_type,
            url = %config.url,
            "Creating store"
        );
        self.factory(config.store_type)?
            .create(config, skip_default_registrations)
    }

    /// Default configuration for a store kept at `path`
    pub fn default_store_config(&self, path: &Path) -> StoreConfig {
        StoreConfig::local(path)
    }

    pub fn copy_local_store(
        &self,
        config: &StoreConfig,
        config_path: &Path,
        load_config_path: Option<&Path>,
    ) -> Result<StoreConfig, StoreError> {
        self.factory(config.store_type)?
            .copy_local_store(config, config_path, load_config_path)
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("registered", &self.registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    include!("registry.test.rs");
}
