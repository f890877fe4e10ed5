//! Lifecycle of the process-wide configuration
//!
//! Kept as a single test: the instance is global to the test binary.

use anyhow::Result;
use keel_lib::config::instance::lock;
use keel_lib::config::{GlobalConfig, SettingsOverrides, StoreType};
use keel_tests::TestEnvironment;
use std::sync::Arc;

#[test]
fn test_instance_lifecycle() -> Result<()> {
    let test_env = TestEnvironment::new()?;
    test_env.env.set(
        "KEEL_CONFIG_PATH",
        test_env.config_path.to_string_lossy().to_string(),
    );

    assert!(GlobalConfig::get_instance().is_none());

    // First request loads, migrates and connects the default store
    let shared = GlobalConfig::instance_with(test_env.context())?;
    {
        let config = lock(&shared);
        assert_eq!(config.config_directory(), test_env.config_path.as_path());
        assert_eq!(
            config.schema_version().as_deref(),
            Some(env!("CARGO_PKG_VERSION"))
        );
        assert_eq!(
            config.store_config().map(|store| store.store_type),
            Some(StoreType::Local)
        );
        assert!(config.has_connected_store());
    }

    // Later requests return the same instance
    let again = GlobalConfig::instance_with(test_env.context())?;
    assert!(Arc::ptr_eq(&shared, &again));
    let current = GlobalConfig::get_instance().expect("instance exists");
    assert!(Arc::ptr_eq(&shared, &current));

    // An explicitly loaded configuration is independent of the instance
    let other_dir = test_env.directory("other")?;
    let mut explicit =
        GlobalConfig::load(&other_dir, SettingsOverrides::default(), test_env.context())?;
    explicit.set_analytics_opt_in(false)?;
    assert!(lock(&shared).analytics_opt_in());

    // Resetting swaps the instance; old handles keep the old configuration
    GlobalConfig::reset_instance(Some(explicit));
    let swapped = GlobalConfig::get_instance().expect("instance exists");
    assert!(!Arc::ptr_eq(&shared, &swapped));
    assert_eq!(lock(&swapped).config_directory(), other_dir.as_path());
    assert_eq!(
        lock(&shared).config_directory(),
        test_env.config_path.as_path()
    );

    GlobalConfig::reset_instance(None);
    assert!(GlobalConfig::get_instance().is_none());
    Ok(())
}
