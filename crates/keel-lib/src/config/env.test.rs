use super::*;
use crate::config::store_config::StoreType;

#[test]
fn test_env_var_name_uses_prefix() {
    assert_eq!(env_var_name("user_email"), "KEEL_USER_EMAIL");
    assert_eq!(env_var_name("store"), "KEEL_STORE");
}

#[test]
fn test_no_overrides_returns_stored_values() {
    let stored = GlobalSettings::default();
    let view = resolve_settings(&stored, &MapEnv::new());
    assert_eq!(view, stored);
}

#[test]
fn test_valid_overrides_win() {
    let stored = GlobalSettings::default();
    let user_id = Uuid::new_v4();
    let env = MapEnv::new()
        .with("KEEL_USER_ID", user_id.to_string())
        .with("KEEL_USER_EMAIL", "env@example.com")
        .with("KEEL_ANALYTICS_OPT_IN", "false")
        .with("KEEL_SCHEMA_VERSION", "9.9.9")
        .with("KEEL_ACTIVE_PROJECT_NAME", "research")
        .with("KEEL_SECRET_KEY", "from-env");

    let view = resolve_settings(&stored, &env);

    assert_eq!(view.user_id, user_id);
    assert_eq!(view.user_email.as_deref(), Some("env@example.com"));
    assert!(!view.analytics_opt_in);
    assert_eq!(view.schema_version.as_deref(), Some("9.9.9"));
    assert_eq!(view.active_project_name.as_deref(), Some("research"));
    assert_eq!(view.secret_key, "from-env");
}

#[test]
fn test_unparseable_overrides_are_ignored() {
    let stored = GlobalSettings {
        schema_version: Some("0.4.0".to_string()),
        ..GlobalSettings::default()
    };
    let env = MapEnv::new()
        .with("KEEL_USER_ID", "not-a-uuid")
        .with("KEEL_ANALYTICS_OPT_IN", "maybe")
        .with("KEEL_SCHEMA_VERSION", "banana")
        .with("KEEL_ACTIVE_STACK_ID", "42")
        .with("KEEL_STORE", "[1, 2, 3]");

    let view = resolve_settings(&stored, &env);

    assert_eq!(view, stored);
}

#[test]
fn test_store_override_accepts_yaml_and_json() {
    let stored = GlobalSettings::default();

    let env = MapEnv::new().with("KEEL_STORE", r#"{"type": "rest", "url": "http://host:8080"}"#);
    let view = resolve_settings(&stored, &env);
    let store = view.store_config.unwrap();
    assert_eq!(store.store_type, StoreType::Rest);
    assert_eq!(store.url, "http://host:8080");

    env.set("KEEL_STORE", "type: sql\nurl: sqlite:///tmp/keel.db\n");
    let view = resolve_settings(&stored, &env);
    assert_eq!(view.store_config.unwrap().store_type, StoreType::Sql);
}

#[test]
fn test_parse_bool_spellings() {
    for raw in ["1", "true", "TRUE", "yes", "On", "y", "t"] {
        assert_eq!(parse_bool(raw), Some(true), "{raw}");
    }
    for raw in ["0", "false", "No", "off", "n", "F"] {
        assert_eq!(parse_bool(raw), Some(false), "{raw}");
    }
    assert_eq!(parse_bool("2"), None);
    assert_eq!(parse_bool(""), None);
}

#[test]
fn test_map_env_clones_share_values() {
    let env = MapEnv::new();
    let shared: Arc<dyn EnvSource> = Arc::new(env.clone());

    env.set("KEEL_USER_EMAIL", "late@example.com");
    assert_eq!(
        shared.var("KEEL_USER_EMAIL").as_deref(),
        Some("late@example.com")
    );

    env.remove("KEEL_USER_EMAIL");
    assert_eq!(shared.var("KEEL_USER_EMAIL"), None);
}
