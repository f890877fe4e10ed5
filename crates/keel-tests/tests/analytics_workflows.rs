//! Integration tests for analytics around the global configuration
//!
//! Covers the opt-in flag as seen through commands, environment overrides
//! and server connections.

use anyhow::Result;
use keel_lib::analytics::{AnalyticsEvent, AnalyticsGroup};
use keel_lib::application::cli::{AnalyticsCommand, Commands};
use keel_lib::application::execute_command_with_config;
use keel_lib::config::StoreConfig;
use keel_lib::testing::MockStoreFactory;
use keel_tests::TestEnvironment;

#[test]
fn test_opt_out_command_persists() -> Result<()> {
    let test_env = TestEnvironment::new()?;
    let mut config = test_env.load_config()?;

    execute_command_with_config(
        Commands::Analytics {
            action: AnalyticsCommand::OptOut,
        },
        &mut config,
    )?;

    let reloaded = test_env.load_config()?;
    assert!(!reloaded.analytics_opt_in());
    assert_eq!(
        test_env.analytics.events(),
        vec![AnalyticsEvent::OptOutAnalytics]
    );
    Ok(())
}

#[test]
fn test_server_connection_identifies_group() -> Result<()> {
    let factory = MockStoreFactory::new().with_opted_in_user("owner@example.com");
    let info = factory.store_info();
    let test_env = TestEnvironment::with_rest_store(factory)?;
    let mut config = test_env.load_config()?;

    config.set_store(StoreConfig::from_url("https://keel.example.com"), false)?;

    let groups = test_env.analytics.identified_groups();
    assert_eq!(groups.len(), 1);
    let (group, group_id, metadata) = &groups[0];
    assert_eq!(*group, AnalyticsGroup::ServerGroup);
    assert_eq!(group_id, &info.id.to_string());
    assert_eq!(metadata["deployment_type"], "docker");
    assert_eq!(metadata["database_type"], "mysql");

    let users = test_env.analytics.identified_users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "owner@example.com");
    assert_eq!(config.user_email().as_deref(), Some("owner@example.com"));

    let events = test_env.analytics.events();
    assert!(events.contains(&AnalyticsEvent::ServerConnected));
    assert!(events.contains(&AnalyticsEvent::InitializedStore));
    Ok(())
}

#[test]
fn test_environment_opt_out_silences_server_connection() -> Result<()> {
    let factory = MockStoreFactory::new().with_opted_in_user("owner@example.com");
    let test_env = TestEnvironment::with_rest_store(factory)?;
    test_env.env.set("KEEL_ANALYTICS_OPT_IN", "false");
    let mut config = test_env.load_config()?;

    config.set_store(StoreConfig::from_url("https://keel.example.com"), false)?;

    assert!(test_env.analytics.calls().is_empty());
    // The stored flag is untouched by the override
    assert!(config.stored_settings().analytics_opt_in);
    Ok(())
}
