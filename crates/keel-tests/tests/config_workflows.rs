//! Integration tests for `keel config` workflows
//!
//! Runs the command handlers against a hermetic configuration directory:
//! - Connecting to a server and selecting a project
//! - Switching back to the default local store
//! - Settings surviving a reload
//! - Copying a configuration for another process

use anyhow::Result;
use keel_lib::application::cli::{Commands, ConfigCommand};
use keel_lib::application::execute_command_with_config;
use keel_lib::config::StoreType;
use keel_lib::testing::MockStoreFactory;
use keel_tests::TestEnvironment;

fn config_set(url: Option<&str>, project: Option<&str>, local_store: bool) -> Commands {
    Commands::Config {
        action: ConfigCommand::Set {
            url: url.map(str::to_string),
            username: url.map(|_| "default".to_string()),
            password: url.map(|_| "secret".to_string()),
            project: project.map(str::to_string),
            local_store,
        },
    }
}

#[test]
fn test_connect_server_and_select_project() -> Result<()> {
    let factory = MockStoreFactory::new().with_project("research");
    let test_env = TestEnvironment::with_rest_store(factory.clone())?;
    let mut config = test_env.load_config()?;

    execute_command_with_config(
        config_set(Some("https://keel.example.com"), Some("research"), false),
        &mut config,
    )?;

    let store = config.store_config().expect("store configured");
    assert_eq!(store.store_type, StoreType::Rest);
    assert_eq!(store.url, "https://keel.example.com");
    assert_eq!(config.active_project()?.name, "research");

    // Reloading from disk sees the same store and project
    let reloaded = test_env.load_config()?;
    assert_eq!(reloaded.store_config(), Some(store));
    assert_eq!(reloaded.active_project_name().as_deref(), Some("research"));

    let written = test_env.read_config_file()?;
    assert!(written.contains("https://keel.example.com"));
    Ok(())
}

#[test]
fn test_switch_back_to_local_store() -> Result<()> {
    let test_env = TestEnvironment::with_rest_store(MockStoreFactory::new())?;
    let mut config = test_env.load_config()?;

    execute_command_with_config(
        config_set(Some("http://localhost:8080"), None, false),
        &mut config,
    )?;
    execute_command_with_config(config_set(None, None, true), &mut config)?;

    let store = config.store_config().expect("store configured");
    assert_eq!(store.store_type, StoreType::Local);
    assert!(
        store
            .local_path()
            .expect("local path")
            .starts_with(&test_env.config_path)
    );
    assert_eq!(config.zen_store()?.store_type(), StoreType::Local);
    Ok(())
}

#[test]
fn test_describe_after_connecting() -> Result<()> {
    let test_env = TestEnvironment::new()?;
    let mut config = test_env.load_config()?;

    execute_command_with_config(config_set(None, None, true), &mut config)?;
    execute_command_with_config(
        Commands::Config {
            action: ConfigCommand::Describe,
        },
        &mut config,
    )?;

    assert_eq!(config.active_project()?.name, "default");
    Ok(())
}

#[test]
fn test_hand_edited_config_is_respected() -> Result<()> {
    let test_env = TestEnvironment::new()?;
    test_env.write_config_file(
        "user_id: 2b9a3c34-36f3-4c4a-9a4e-5c3ac5b8f0aa\n\
         analytics_opt_in: false\n\
         user_email: someone@example.com\n\
         custom_key: kept\n",
    )?;

    let config = test_env.load_config()?;
    assert_eq!(
        config.user_id().to_string(),
        "2b9a3c34-36f3-4c4a-9a4e-5c3ac5b8f0aa"
    );
    assert!(!config.analytics_opt_in());

    config.persist()?;
    let written = test_env.read_config_file()?;
    assert!(written.contains("custom_key"));
    Ok(())
}

#[test]
fn test_copy_configuration_for_another_process() -> Result<()> {
    let test_env = TestEnvironment::new()?;
    let mut config = test_env.load_config()?;
    config.zen_store()?;

    let target = test_env.directory("copy")?;
    let mounted = test_env.root().join("mounted");
    let copy = config.copy_configuration(&target, Some(mounted.as_path()), None)?;

    // Store data lands next to the copy but is referenced from the load path
    assert!(
        target
            .join("local_stores")
            .join("default_store")
            .join("store.yaml")
            .exists()
    );
    let copied_path = copy
        .store_config()
        .and_then(|store| store.local_path())
        .expect("local store path");
    assert!(copied_path.starts_with(&mounted));

    // The source is unchanged
    let source_path = config
        .store_config()
        .and_then(|store| store.local_path())
        .expect("local store path");
    assert!(source_path.starts_with(&test_env.config_path));
    assert_eq!(copy.user_id(), config.user_id());
    Ok(())
}
