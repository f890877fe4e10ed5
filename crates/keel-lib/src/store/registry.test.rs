use super::*;
use crate::testing::MockStoreFactory;
use tempfile::TempDir;

#[test]
fn test_defaults_register_local_only() {
    let registry = StoreRegistry::with_defaults();
    assert_eq!(registry.registered(), vec![StoreType::Local]);
}

#[test]
fn test_unregistered_type_lists_registered_kinds() {
    let registry = StoreRegistry::with_defaults();
    let config = StoreConfig::from_url("http://host:8080");

    let error = match registry.create_store(&config, false) {
        Ok(_) => panic!("rest stores are not registered"),
        Err(e) => e,
    };

    assert_eq!(
        error.to_string(),
        "Unsupported store type 'rest'. Registered store types: local"
    );
}

#[test]
fn test_registered_factory_builds_store() {
    let factory = MockStoreFactory::new();
    let counters = factory.counters();
    let registry = StoreRegistry::new().with(StoreType::Rest, factory);
    let config = StoreConfig::from_url("http://host:8080");

    let store = registry.create_store(&config, false).unwrap();

    assert_eq!(store.store_type(), StoreType::Rest);
    assert_eq!(store.config(), &config);
    assert_eq!(counters.created(), 1);
}

#[test]
fn test_register_replaces_previous_factory() {
    let mut registry = StoreRegistry::with_defaults();
    let replaced = registry.register(StoreType::Local, Arc::new(MockStoreFactory::new()));
    assert!(replaced.is_some());
    assert_eq!(registry.registered(), vec![StoreType::Local]);
}

#[test]
fn test_default_store_config_is_local() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("default_store");
    let config = StoreRegistry::with_defaults().default_store_config(&path);

    assert_eq!(config.store_type, StoreType::Local);
    assert_eq!(config.local_path(), Some(path));
}

#[test]
fn test_remote_copy_returns_config_unchanged() {
    let temp = TempDir::new().unwrap();
    let registry = StoreRegistry::new().with(StoreType::Rest, MockStoreFactory::new());
    let config = StoreConfig::from_url("http://host:8080");

    let copied = registry
        .copy_local_store(&config, temp.path(), None)
        .unwrap();
    assert_eq!(copied, config);
}
