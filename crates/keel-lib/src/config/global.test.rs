use super::*;
use crate::config::env::MapEnv;
use crate::primitives::StoreError;
use crate::testing::{
    AnalyticsCall, MockStoreFactory, RecordingAnalytics, recording_context, registry_with_rest,
};
use std::fs;
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    env: MapEnv,
    analytics: Arc<RecordingAnalytics>,
    context: ConfigContext,
}

impl Fixture {
    fn new() -> Self {
        Self::with_registry(StoreRegistry::with_defaults())
    }

    fn with_registry(registry: StoreRegistry) -> Self {
        let env = MapEnv::new();
        let (context, analytics) = recording_context(env.clone());
        Self {
            temp: TempDir::new().unwrap(),
            env,
            analytics,
            context: context.with_registry(registry),
        }
    }

    fn dir(&self) -> &Path {
        self.temp.path()
    }

    fn load(&self) -> GlobalConfig {
        GlobalConfig::load(self.dir(), SettingsOverrides::default(), self.context.clone()).unwrap()
    }

    fn file_content(&self) -> String {
        fs::read_to_string(codec::config_file(self.dir())).unwrap()
    }
}

fn rest_config() -> StoreConfig {
    StoreConfig::from_url("http://host:8080").with_credentials(Some("default".into()), None)
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_fresh_directory_writes_config_immediately() {
    let fx = Fixture::new();
    assert!(!codec::config_file(fx.dir()).exists());

    let config = fx.load();

    assert!(config.config_file().exists());
    assert!(config.store_config().is_none());
    assert!(config.schema_version().is_none());
    assert!(config.analytics_opt_in());
    assert!(!config.has_connected_store());
}

#[test]
fn test_fresh_instances_get_distinct_identities() {
    let a = Fixture::new().load();
    let b = Fixture::new().load();

    assert_ne!(a.user_id(), b.user_id());
    assert_ne!(a.secret_key(), b.secret_key());
}

#[test]
fn test_load_applies_overrides_over_file() {
    let fx = Fixture::new();
    fx.load().set_analytics_opt_in(true).unwrap();

    let config = GlobalConfig::load(
        fx.dir(),
        SettingsOverrides {
            analytics_opt_in: Some(false),
            ..SettingsOverrides::default()
        },
        fx.context.clone(),
    )
    .unwrap();

    assert!(!config.analytics_opt_in());
}

#[test]
fn test_load_rejects_invalid_schema_version() {
    let fx = Fixture::new();
    fs::write(codec::config_file(fx.dir()), "schema_version: not-a-version\n").unwrap();

    let error =
        GlobalConfig::load(fx.dir(), SettingsOverrides::default(), fx.context.clone()).unwrap_err();

    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "schema_version"));
}

#[test]
fn test_first_store_access_sets_up_default_store() {
    let fx = Fixture::new();
    let mut config = fx.load();
    assert!(config.store_config().is_none());

    let store_type = config.zen_store().unwrap().store_type();

    assert_eq!(store_type, StoreType::Local);
    let store = config.stored_settings().store_config.clone().unwrap();
    assert_eq!(
        store.local_path(),
        Some(fx.dir().join("local_stores").join("default_store"))
    );

    // persisted, not just cached
    let reloaded = fx.load();
    assert_eq!(reloaded.store_config(), Some(store));
    assert_eq!(reloaded.active_project_name().as_deref(), Some("default"));
    assert!(reloaded.active_stack_id().is_some());

    assert_eq!(
        fx.analytics.calls(),
        vec![AnalyticsCall::Event {
            event: AnalyticsEvent::InitializedStore,
            properties: Some(metadata([("store_type", "local")])),
        }]
    );
}

// =============================================================================
// Reads and writes
// =============================================================================

#[test]
fn test_write_then_read_returns_written_value() {
    let fx = Fixture::new();
    let mut config = fx.load();
    let stack_id = Uuid::new_v4();

    config.set_analytics_opt_in(false).unwrap();
    config.set_schema_version("0.3.1").unwrap();
    config.set_active_stack_id(Some(stack_id)).unwrap();
    config.set_active_project_name(Some("research".to_string())).unwrap();
    config.set_store_config(Some(rest_config())).unwrap();
    config
        .set_email_address("ada@example.com", AnalyticsEventSource::Connect)
        .unwrap();

    assert!(!config.analytics_opt_in());
    assert_eq!(config.schema_version().as_deref(), Some("0.3.1"));
    assert_eq!(config.active_stack_id(), Some(stack_id));
    assert_eq!(config.active_project_name().as_deref(), Some("research"));
    assert_eq!(config.store_config(), Some(rest_config()));
    assert_eq!(config.user_email().as_deref(), Some("ada@example.com"));
}

#[test]
fn test_round_trip_through_fresh_instance() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.set_analytics_opt_in(false).unwrap();
    config.set_schema_version("0.3.1").unwrap();
    config.set_active_stack_id(Some(Uuid::new_v4())).unwrap();
    config.set_active_project_name(Some("research".to_string())).unwrap();
    config.set_store_config(Some(rest_config())).unwrap();
    config
        .set_email_address("ada@example.com", AnalyticsEventSource::Connect)
        .unwrap();

    let reloaded = fx.load();

    assert_eq!(reloaded.stored_settings(), config.stored_settings());
}

#[test]
fn test_invalid_write_leaves_value_unchanged() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.set_schema_version("0.3.0").unwrap();

    let error = config.set_schema_version("three").unwrap_err();

    assert!(matches!(error, ConfigError::Validation { .. }));
    assert_eq!(config.schema_version().as_deref(), Some("0.3.0"));
    assert!(fx.file_content().contains("0.3.0"));

    let error = config
        .set_store_config(Some(StoreConfig::new(StoreType::Rest, "")))
        .unwrap_err();
    assert!(matches!(error, ConfigError::Validation { .. }));
    assert!(config.store_config().is_none());
}

#[test]
fn test_env_override_is_read_only() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config
        .set_email_address("stored@example.com", AnalyticsEventSource::Connect)
        .unwrap();
    let before = fx.file_content();

    fx.env.set("KEEL_USER_EMAIL", "env@example.com");
    fx.env.set("KEEL_ANALYTICS_OPT_IN", "false");
    fx.env.set("KEEL_ACTIVE_PROJECT_NAME", "from-env");

    assert_eq!(config.user_email().as_deref(), Some("env@example.com"));
    assert!(!config.analytics_opt_in());
    assert_eq!(config.active_project_name().as_deref(), Some("from-env"));
    assert_eq!(
        config.stored_settings().user_email.as_deref(),
        Some("stored@example.com")
    );
    assert_eq!(fx.file_content(), before);

    fx.env.remove("KEEL_USER_EMAIL");
    fx.env.remove("KEEL_ANALYTICS_OPT_IN");
    fx.env.remove("KEEL_ACTIVE_PROJECT_NAME");

    assert_eq!(config.user_email().as_deref(), Some("stored@example.com"));
    assert!(config.analytics_opt_in());
    assert_eq!(config.active_project_name(), None);
}

#[test]
fn test_store_env_override_connects_without_persisting() {
    let fx = Fixture::new();
    let mut config = fx.load();
    let before = fx.file_content();
    let elsewhere = fx.dir().join("elsewhere");
    let url = format!("file://{}", elsewhere.display());

    fx.env
        .set("KEEL_STORE", format!("{{type: local, url: '{url}'}}"));

    let store = config.zen_store().unwrap();
    assert_eq!(store.store_type(), StoreType::Local);
    assert_eq!(store.config().url, url);
    assert!(elsewhere.join("store.yaml").exists());

    assert_eq!(config.stored_settings().store_config, None);
    assert_eq!(config.stored_settings().active_project_name, None);
    assert_eq!(config.stored_settings().active_stack_id, None);
    assert_eq!(fx.file_content(), before);
}

#[test]
fn test_project_env_override_survives_store_setup() {
    let fx = Fixture::new();
    let mut config = fx.load();
    fx.env.set("KEEL_ACTIVE_PROJECT_NAME", "default");

    config.zen_store().unwrap();

    assert_eq!(config.stored_settings().active_project_name, None);
    assert!(config.stored_settings().store_config.is_some());
    assert!(config.stored_settings().active_stack_id.is_some());
    assert_eq!(config.active_project().unwrap().name, "default");
}

#[test]
fn test_malformed_env_override_falls_back() {
    let fx = Fixture::new();
    let config = fx.load();
    let user_id = config.user_id();

    fx.env.set("KEEL_USER_ID", "definitely-not-a-uuid");
    fx.env.set("KEEL_ANALYTICS_OPT_IN", "perhaps");

    assert_eq!(config.user_id(), user_id);
    assert!(config.analytics_opt_in());
}

// =============================================================================
// Migration
// =============================================================================

#[test]
fn test_migrate_initializes_then_is_idempotent() {
    let fx = Fixture::new();
    let mut config = fx.load();
    let current = config.context().app_version.clone();

    let first = config.migrate().unwrap();
    assert_eq!(first, MigrationOutcome::Initialized { to: current.clone() });
    assert_eq!(config.schema_version(), Some(current.to_string()));
    let after_first = fx.file_content();

    let second = config.migrate().unwrap();
    assert_eq!(second, MigrationOutcome::UpToDate);
    assert_eq!(fx.file_content(), after_first);
}

#[test]
fn test_migrate_moves_older_version_forward() {
    let mut fx = Fixture::new();
    fx.context = fx.context.clone().with_app_version(Version::new(0, 5, 0));
    let mut config = fx.load();
    config.set_schema_version("0.4.2").unwrap();

    let outcome = config.migrate().unwrap();

    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            from: Version::new(0, 4, 2),
            to: Version::new(0, 5, 0)
        }
    );
    assert_eq!(fx.load().schema_version().as_deref(), Some("0.5.0"));
}

#[test]
fn test_migrate_never_downgrades() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.set_schema_version("999.0.0").unwrap();
    let before = fx.file_content();

    let outcome = config.migrate().unwrap();

    assert!(matches!(outcome, MigrationOutcome::Downgrade { .. }));
    assert_eq!(config.schema_version().as_deref(), Some("999.0.0"));
    assert_eq!(fx.file_content(), before);
}

#[test]
fn test_migrate_accepts_short_versions() {
    let mut fx = Fixture::new();
    fx.context = fx.context.clone().with_app_version(Version::new(0, 20, 0));
    let mut config = fx.load();
    config.set_schema_version("0.20").unwrap();

    assert_eq!(config.migrate().unwrap(), MigrationOutcome::UpToDate);
}

// =============================================================================
// Email and analytics
// =============================================================================

#[test]
fn test_same_email_identifies_once() {
    let fx = Fixture::new();
    let mut config = fx.load();

    config
        .set_email_address("a@x.com", AnalyticsEventSource::Connect)
        .unwrap();
    config
        .set_email_address("a@x.com", AnalyticsEventSource::Connect)
        .unwrap();
    assert_eq!(fx.analytics.identified_users().len(), 1);

    config
        .set_email_address("b@x.com", AnalyticsEventSource::Connect)
        .unwrap();
    let identified = fx.analytics.identified_users();
    assert_eq!(identified.len(), 2);
    assert_eq!(identified[0]["email"], "a@x.com");
    assert_eq!(identified[1]["email"], "b@x.com");
    assert_eq!(identified[1]["source"], "keel connect");
}

#[test]
fn test_empty_email_is_ignored() {
    let fx = Fixture::new();
    let mut config = fx.load();
    let before = fx.file_content();

    config
        .set_email_address("", AnalyticsEventSource::Connect)
        .unwrap();

    assert_eq!(config.user_email(), None);
    assert!(fx.analytics.calls().is_empty());
    assert_eq!(fx.file_content(), before);
}

#[test]
fn test_opted_out_config_sends_no_analytics() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.set_analytics_opt_in(false).unwrap();

    config
        .set_email_address("a@x.com", AnalyticsEventSource::Connect)
        .unwrap();
    config.zen_store().unwrap();
    assert!(fx.analytics.calls().is_empty());

    config.track_event(AnalyticsEvent::OptOutAnalytics, None);
    assert_eq!(fx.analytics.events(), vec![AnalyticsEvent::OptOutAnalytics]);
}

// =============================================================================
// Store lifecycle
// =============================================================================

#[test]
fn test_default_store_from_store_env_vars() {
    let fx = Fixture::new();
    fx.env.set("KEEL_STORE_URL", "http://host:8080");
    fx.env.set("KEEL_STORE_USERNAME", "default");
    fx.env.set("KEEL_STORE_PASSWORD", "");
    let config = fx.load();

    let store = config.get_default_store().unwrap();

    assert_eq!(store, rest_config());
    assert!(store.local_path().is_none());
}

#[test]
fn test_default_store_without_env_is_local_under_config_dir() {
    let fx = Fixture::new();
    let config = fx.load();

    let store = config.get_default_store().unwrap();

    assert_eq!(store.store_type, StoreType::Local);
    assert_eq!(
        store.local_path(),
        Some(config.local_stores_path().join("default_store"))
    );
}

#[test]
fn test_unregistered_store_type_propagates() {
    let fx = Fixture::new();
    let mut config = fx.load();

    let error = config.set_store(rest_config(), false).unwrap_err();

    assert!(matches!(
        error,
        ConfigError::Store(StoreError::UnsupportedStoreType { .. })
    ));
    assert!(config.store_config().is_none());
}

#[test]
fn test_set_rest_store_identifies_server_group() {
    let factory = MockStoreFactory::new();
    let counters = factory.counters();
    let info = factory.store_info();
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();

    config.set_store(rest_config(), false).unwrap();

    assert_eq!(counters.get_store_info(), 1);
    let groups = fx.analytics.identified_groups();
    assert_eq!(groups.len(), 1);
    let (group, group_id, group_metadata) = &groups[0];
    assert_eq!(*group, AnalyticsGroup::ServerGroup);
    assert_eq!(group_id, &info.id.to_string());
    assert_eq!(group_metadata["deployment_type"], "docker");
    assert_eq!(group_metadata["database_type"], "mysql");
    assert_eq!(
        fx.analytics.events(),
        vec![AnalyticsEvent::ServerConnected, AnalyticsEvent::InitializedStore]
    );
}

#[test]
fn test_set_non_server_store_skips_store_info() {
    let factory = MockStoreFactory::new();
    let counters = factory.counters();
    let registry = StoreRegistry::with_defaults().with(StoreType::Sql, factory);
    let fx = Fixture::with_registry(registry);
    let mut config = fx.load();

    config
        .set_store(StoreConfig::from_url("mysql://db:3306/keel"), false)
        .unwrap();

    assert_eq!(counters.get_store_info(), 0);
    assert!(fx.analytics.identified_groups().is_empty());
    assert_eq!(fx.analytics.events(), vec![AnalyticsEvent::InitializedStore]);
}

#[test]
fn test_set_store_sanitizes_active_selection() {
    let factory = MockStoreFactory::new();
    let default_stack = factory.default_stack_of("default").unwrap();
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();
    config
        .set_active_project_name(Some("vanished".to_string()))
        .unwrap();
    config.set_active_stack_id(Some(Uuid::new_v4())).unwrap();

    config.set_store(rest_config(), false).unwrap();

    assert_eq!(config.active_project_name().as_deref(), Some("default"));
    assert_eq!(config.active_stack_id(), Some(default_stack.id));
    assert_eq!(fx.load().active_stack_id(), Some(default_stack.id));
}

#[test]
fn test_opted_in_server_user_email_is_propagated() {
    let factory = MockStoreFactory::new().with_opted_in_user("ops@example.com");
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();

    config.set_store(rest_config(), false).unwrap();

    assert_eq!(config.user_email().as_deref(), Some("ops@example.com"));
    let identified = fx.analytics.identified_users();
    assert_eq!(identified.len(), 1);
    assert_eq!(identified[0]["source"], "keel server");
}

#[test]
fn test_reconnect_with_existing_handle_tags_connect_source() {
    let factory = MockStoreFactory::new().with_opted_in_user("ops@example.com");
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();
    config.zen_store().unwrap();
    assert!(config.user_email().is_none());

    config.set_store(rest_config(), false).unwrap();

    let identified = fx.analytics.identified_users();
    assert_eq!(identified.len(), 1);
    assert_eq!(identified[0]["source"], "keel connect");
}

#[test]
fn test_same_store_config_keeps_connected_store() {
    let factory = MockStoreFactory::new();
    let counters = factory.counters();
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();

    config.set_store(rest_config(), false).unwrap();
    config.zen_store().unwrap();
    config.zen_store().unwrap();

    assert_eq!(counters.created(), 1);
}

#[test]
fn test_changing_store_config_replaces_handle() {
    let factory = MockStoreFactory::new();
    let counters = factory.counters();
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();
    config.set_store(rest_config(), false).unwrap();

    let other = StoreConfig::from_url("https://other:443");
    config.set_store_config(Some(other.clone())).unwrap();
    assert!(!config.has_connected_store());

    assert_eq!(config.zen_store().unwrap().config(), &other);
    assert_eq!(counters.created(), 2);
    assert_eq!(counters.configs().last(), Some(&other));
}

// =============================================================================
// Active project
// =============================================================================

#[test]
fn test_active_project_requires_a_name() {
    let fx = Fixture::new();
    let mut config = fx.load();

    let error = config.active_project().unwrap_err();

    assert!(matches!(error, ConfigError::NoActiveProject));
    assert!(error.to_string().contains("keel config set --project"));
}

#[test]
fn test_set_active_project_avoids_backend_round_trip() {
    let factory = MockStoreFactory::new().with_project("research");
    let counters = factory.counters();
    let research = factory.project("research").unwrap();
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();

    config.set_active_project(research.clone()).unwrap();

    assert_eq!(config.active_project().unwrap(), research);
    assert_eq!(counters.get_project(), 0);
    assert_eq!(counters.created(), 0);
    assert_eq!(fx.load().active_project_name().as_deref(), Some("research"));
}

#[test]
fn test_renamed_active_project_is_refetched() {
    let factory = MockStoreFactory::new().with_project("research");
    let counters = factory.counters();
    let fx = Fixture::with_registry(registry_with_rest(factory));
    let mut config = fx.load();
    config.set_store(rest_config(), false).unwrap();
    let calls_after_connect = counters.get_project();

    config
        .set_active_project_name(Some("research".to_string()))
        .unwrap();
    let project = config.active_project().unwrap();
    assert_eq!(project.name, "research");
    assert_eq!(counters.get_project(), calls_after_connect + 1);

    config.active_project().unwrap();
    assert_eq!(counters.get_project(), calls_after_connect + 1);
}

// =============================================================================
// Copying
// =============================================================================

#[test]
fn test_copy_configuration_duplicates_local_store() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.zen_store().unwrap();
    let target = TempDir::new().unwrap();

    let copy = config
        .copy_configuration(target.path(), None, None)
        .unwrap();

    assert_eq!(copy.user_id(), config.user_id());
    assert_eq!(copy.config_directory(), target.path());
    let expected_store = target.path().join("local_stores").join("default_store");
    assert_eq!(
        copy.store_config().and_then(|s| s.local_path()),
        Some(expected_store.clone())
    );
    assert!(expected_store.join("store.yaml").exists());

    // source untouched
    assert_eq!(
        config.store_config().and_then(|s| s.local_path()),
        Some(fx.dir().join("local_stores").join("default_store"))
    );
}

#[test]
fn test_copy_configuration_uses_load_path() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.zen_store().unwrap();
    let target = TempDir::new().unwrap();

    let copy = config
        .copy_configuration(target.path(), Some(Path::new("/config")), None)
        .unwrap();

    assert_eq!(
        copy.store_config().and_then(|s| s.local_path()),
        Some(PathBuf::from("/config/local_stores/default_store"))
    );
    let on_disk = GlobalConfig::load(target.path(), SettingsOverrides::default(), fx.context.clone())
        .unwrap();
    assert_eq!(on_disk.store_config(), copy.store_config());
}

#[test]
fn test_copy_configuration_store_override_is_verbatim() {
    let fx = Fixture::new();
    let mut config = fx.load();
    config.zen_store().unwrap();
    let target = TempDir::new().unwrap();

    let copy = config
        .copy_configuration(target.path(), None, Some(rest_config()))
        .unwrap();

    assert_eq!(copy.store_config(), Some(rest_config()));
    assert!(!target.path().join("local_stores").exists());
}

#[test]
fn test_copy_without_store_has_no_store() {
    let fx = Fixture::new();
    let config = fx.load();
    let target = TempDir::new().unwrap();

    let copy = config
        .copy_configuration(target.path(), None, None)
        .unwrap();

    assert!(copy.store_config().is_none());
    assert_eq!(copy.secret_key(), config.secret_key());
}
