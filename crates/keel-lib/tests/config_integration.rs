use keel_lib::application::config::AppConfig;
use keel_lib::config::{ConfigContext, GlobalConfig, MapEnv, SettingsOverrides, StoreType};
use keel_lib::primitives::{LogFormat, LogLevel, LogOutput};
use std::fs;
use tempfile::TempDir;

fn context(env: MapEnv) -> ConfigContext {
    ConfigContext::default().with_env(env)
}

#[test]
fn test_app_config_defaults() {
    let config = AppConfig::default();

    assert_eq!(config.log_level, LogLevel::Warning);
    assert_eq!(config.log_format, LogFormat::Text);
    assert_eq!(config.log_output, LogOutput::Stderr);
}

#[test]
fn test_fresh_directory_round_trip() {
    let temp = TempDir::new().unwrap();

    let first = GlobalConfig::load(
        temp.path(),
        SettingsOverrides::default(),
        context(MapEnv::new()),
    )
    .unwrap();
    assert!(temp.path().join("config.yaml").exists());

    let second = GlobalConfig::load(
        temp.path(),
        SettingsOverrides::default(),
        context(MapEnv::new()),
    )
    .unwrap();

    assert_eq!(first.user_id(), second.user_id());
    assert_eq!(first.secret_key(), second.secret_key());
}

#[test]
fn test_local_store_is_created_on_first_use() {
    let temp = TempDir::new().unwrap();
    let mut config = GlobalConfig::load(
        temp.path(),
        SettingsOverrides::default(),
        context(MapEnv::new()),
    )
    .unwrap();

    let store_type = config.zen_store().unwrap().store_type();

    assert_eq!(store_type, StoreType::Local);
    assert!(
        temp.path()
            .join("local_stores")
            .join("default_store")
            .join("store.yaml")
            .exists()
    );
    assert_eq!(config.active_project().unwrap().name, "default");
    assert!(config.active_stack_id().is_some());
}

#[test]
fn test_environment_override_is_not_written() {
    let temp = TempDir::new().unwrap();
    let env = MapEnv::new().with("KEEL_USER_EMAIL", "env@example.com");
    let mut config =
        GlobalConfig::load(temp.path(), SettingsOverrides::default(), context(env)).unwrap();

    config.set_analytics_opt_in(false).unwrap();

    assert_eq!(config.user_email().as_deref(), Some("env@example.com"));
    let written = fs::read_to_string(temp.path().join("config.yaml")).unwrap();
    assert!(!written.contains("env@example.com"));
}

#[test]
fn test_copy_configuration_with_local_store() {
    let source_dir = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let mut config = GlobalConfig::load(
        source_dir.path(),
        SettingsOverrides::default(),
        context(MapEnv::new()),
    )
    .unwrap();
    config.zen_store().unwrap();

    let copy = config
        .copy_configuration(target_dir.path(), None, None)
        .unwrap();

    let copied_store = copy.store_config().unwrap();
    let copied_path = copied_store.local_path().unwrap();
    assert!(copied_path.starts_with(target_dir.path()));
    assert!(copied_path.join("store.yaml").exists());
    assert_eq!(copy.user_id(), config.user_id());
}
