use super::*;
use crate::config::{MapEnv, SettingsOverrides, StoreType};
use crate::testing::{MockStoreFactory, RecordingAnalytics, recording_context, registry_with_rest};
use crate::store::StoreRegistry;
use std::sync::Arc;
use tempfile::TempDir;

fn load_config(registry: StoreRegistry) -> (TempDir, GlobalConfig, Arc<RecordingAnalytics>) {
    let temp = TempDir::new().unwrap();
    let (context, analytics) = recording_context(MapEnv::new());
    let config = GlobalConfig::load(
        temp.path(),
        SettingsOverrides::default(),
        context.with_registry(registry),
    )
    .unwrap();
    (temp, config, analytics)
}

fn config_set(args: StoreArgs) -> Commands {
    Commands::Config {
        action: ConfigCommand::Set {
            url: args.url,
            username: args.username,
            password: args.password,
            project: args.project,
            local_store: args.local_store,
        },
    }
}

#[test]
fn test_analytics_opt_out_then_in() {
    let (_temp, mut config, analytics) = load_config(StoreRegistry::with_defaults());

    execute_command_with_config(
        Commands::Analytics {
            action: AnalyticsCommand::OptOut,
        },
        &mut config,
    )
    .unwrap();
    assert!(!config.analytics_opt_in());

    execute_command_with_config(
        Commands::Analytics {
            action: AnalyticsCommand::OptIn,
        },
        &mut config,
    )
    .unwrap();
    assert!(config.analytics_opt_in());

    assert_eq!(
        analytics.events(),
        vec![AnalyticsEvent::OptOutAnalytics, AnalyticsEvent::OptInAnalytics]
    );
}

#[test]
fn test_analytics_get_has_no_side_effects() {
    let (_temp, mut config, analytics) = load_config(StoreRegistry::with_defaults());

    execute_command_with_config(
        Commands::Analytics {
            action: AnalyticsCommand::Get,
        },
        &mut config,
    )
    .unwrap();

    assert!(analytics.calls().is_empty());
    assert!(!config.has_connected_store());
}

#[test]
fn test_set_verbosity_rejects_unknown_level() {
    let (_temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    let error = execute_command_with_config(
        Commands::Logging {
            action: LoggingCommand::SetVerbosity {
                verbosity: "LOUD".to_string(),
            },
        },
        &mut config,
    )
    .unwrap_err();

    match error.downcast_ref::<ConfigError>() {
        Some(ConfigError::UnsupportedVerbosity { value, valid }) => {
            assert_eq!(value, "LOUD");
            assert!(valid.contains(&"DEBUG".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_set_verbosity_accepts_known_level() {
    let (_temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    let result = execute_command_with_config(
        Commands::Logging {
            action: LoggingCommand::SetVerbosity {
                verbosity: "debug".to_string(),
            },
        },
        &mut config,
    );

    assert!(result.is_ok());
}

#[test]
fn test_config_set_local_store() {
    let (temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    execute_command_with_config(
        config_set(StoreArgs {
            local_store: true,
            ..StoreArgs::default()
        }),
        &mut config,
    )
    .unwrap();

    let store = config.store_config().unwrap();
    assert_eq!(store.store_type, StoreType::Local);
    assert_eq!(
        store.local_path(),
        Some(temp.path().join("local_stores").join("default_store"))
    );
}

#[test]
fn test_config_set_url_and_project() {
    let factory = MockStoreFactory::new().with_project("research");
    let (_temp, mut config, _) = load_config(registry_with_rest(factory));

    execute_command_with_config(
        config_set(StoreArgs {
            url: Some("http://host:8080".to_string()),
            username: Some("default".to_string()),
            password: Some("secret".to_string()),
            project: Some("research".to_string()),
            local_store: false,
        }),
        &mut config,
    )
    .unwrap();

    let store = config.store_config().unwrap();
    assert_eq!(store.store_type, StoreType::Rest);
    assert_eq!(store.password.as_deref(), Some("secret"));
    assert_eq!(config.active_project().unwrap().name, "research");
}

#[test]
fn test_config_set_unknown_project_fails() {
    let (_temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    let error = execute_command_with_config(
        config_set(StoreArgs {
            project: Some("nowhere".to_string()),
            ..StoreArgs::default()
        }),
        &mut config,
    )
    .unwrap_err();

    assert!(error.to_string().contains("nowhere"));
}

#[test]
fn test_config_set_requires_an_option() {
    let (_temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    let error = execute_command_with_config(config_set(StoreArgs::default()), &mut config)
        .unwrap_err();

    assert!(error.to_string().contains("--url"));
    assert!(config.store_config().is_none());
}

#[test]
fn test_config_set_sql_without_factory_fails() {
    let (_temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    let error = execute_command_with_config(
        config_set(StoreArgs {
            url: Some("mysql://db:3306/keel".to_string()),
            ..StoreArgs::default()
        }),
        &mut config,
    )
    .unwrap_err();

    let root = error.root_cause().to_string();
    assert!(root.contains("Unsupported store type 'sql'"), "{root}");
}

#[test]
fn test_describe_and_explain_succeed() {
    let (_temp, mut config, _) = load_config(StoreRegistry::with_defaults());

    execute_command_with_config(
        Commands::Config {
            action: ConfigCommand::Explain,
        },
        &mut config,
    )
    .unwrap();
    execute_command_with_config(
        Commands::Config {
            action: ConfigCommand::Describe,
        },
        &mut config,
    )
    .unwrap();

    config.zen_store().unwrap();
    execute_command_with_config(
        Commands::Config {
            action: ConfigCommand::Describe,
        },
        &mut config,
    )
    .unwrap();
}
