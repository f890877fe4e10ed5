use super::*;
use crate::config::store_config::StoreType;
use serde_json::json;

fn values(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn test_defaults_generate_identity_and_secret() {
    let a = GlobalSettings::default();
    let b = GlobalSettings::default();

    assert_ne!(a.user_id, b.user_id);
    assert_eq!(a.secret_key.len(), 64);
    assert!(a.secret_key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a.secret_key, b.secret_key);
    assert!(a.analytics_opt_in);
    assert_eq!(a.schema_version, None);
    assert!(a.validate().is_ok());
}

#[test]
fn test_from_values_reads_known_fields() {
    let user_id = Uuid::new_v4();
    let stack_id = Uuid::new_v4();
    let settings = GlobalSettings::from_values(values(json!({
        "user_id": user_id.to_string(),
        "user_email": "ada@example.com",
        "analytics_opt_in": false,
        "schema_version": "0.4.0",
        "store": {"type": "rest", "url": "http://host:8080", "username": "default"},
        "active_stack_id": stack_id.to_string(),
        "active_project_name": "default",
        "secret_key": "abc123",
    })))
    .unwrap();

    assert_eq!(settings.user_id, user_id);
    assert_eq!(settings.user_email.as_deref(), Some("ada@example.com"));
    assert!(!settings.analytics_opt_in);
    assert_eq!(settings.schema_version.as_deref(), Some("0.4.0"));
    let store = settings.store_config.as_ref().unwrap();
    assert_eq!(store.store_type, StoreType::Rest);
    assert_eq!(store.username.as_deref(), Some("default"));
    assert_eq!(settings.active_stack_id, Some(stack_id));
    assert_eq!(settings.secret_key, "abc123");
    assert!(settings.extra.is_empty());
}

#[test]
fn test_from_values_fills_missing_fields() {
    let settings = GlobalSettings::from_values(Map::new()).unwrap();

    assert!(settings.analytics_opt_in);
    assert!(settings.store_config.is_none());
    assert!(!settings.secret_key.is_empty());
}

#[test]
fn test_from_values_keeps_unknown_keys() {
    let settings = GlobalSettings::from_values(values(json!({
        "legacy_flag": true,
        "plugins": ["a", "b"],
    })))
    .unwrap();

    assert_eq!(settings.extra.get("legacy_flag"), Some(&json!(true)));

    let written = settings.to_values().unwrap();
    assert_eq!(written["plugins"], json!(["a", "b"]));
    assert!(written.get("store").is_some());
    assert!(written.get("store_config").is_none());
}

#[test]
fn test_from_values_names_the_bad_field() {
    let error = GlobalSettings::from_values(values(json!({"user_id": "not-a-uuid"}))).unwrap_err();
    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "user_id"));

    let error =
        GlobalSettings::from_values(values(json!({"analytics_opt_in": "sometimes"}))).unwrap_err();
    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "analytics_opt_in"));
}

#[test]
fn test_numeric_yaml_scalars_become_strings() {
    let settings = GlobalSettings::from_values(values(json!({
        "schema_version": 0.2,
        "secret_key": 1234,
    })))
    .unwrap();

    assert_eq!(settings.schema_version.as_deref(), Some("0.2"));
    assert_eq!(settings.secret_key, "1234");
}

#[test]
fn test_validate_rejects_bad_version_and_empty_secret() {
    let settings = GlobalSettings {
        schema_version: Some("not-a-version".to_string()),
        ..GlobalSettings::default()
    };
    let error = settings.validate().unwrap_err();
    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "schema_version"));

    let settings = GlobalSettings {
        secret_key: String::new(),
        ..GlobalSettings::default()
    };
    let error = settings.validate().unwrap_err();
    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "secret_key"));
}

#[test]
fn test_merge_with_only_replaces_provided_values() {
    let base = GlobalSettings {
        user_email: Some("old@example.com".to_string()),
        ..GlobalSettings::default()
    };
    let user_id = base.user_id;

    let merged = base.merge_with(SettingsOverrides {
        analytics_opt_in: Some(false),
        active_project_name: Some("research".to_string()),
        ..SettingsOverrides::default()
    });

    assert_eq!(merged.user_id, user_id);
    assert_eq!(merged.user_email.as_deref(), Some("old@example.com"));
    assert!(!merged.analytics_opt_in);
    assert_eq!(merged.active_project_name.as_deref(), Some("research"));
}

#[test]
fn test_parse_version_pads_short_versions() {
    assert_eq!(parse_version("0.20").unwrap(), Version::new(0, 20, 0));
    assert_eq!(parse_version("2").unwrap(), Version::new(2, 0, 0));
    assert_eq!(parse_version(" 1.2.3 ").unwrap(), Version::new(1, 2, 3));

    let pre = parse_version("0.5-rc1").unwrap();
    assert_eq!((pre.major, pre.minor, pre.patch), (0, 5, 0));
    assert_eq!(pre.pre.as_str(), "rc1");
}

#[test]
fn test_parse_version_rejects_garbage() {
    assert!(parse_version("").is_err());
    assert!(parse_version("abc").is_err());
    assert!(parse_version("1.2.3.4").is_err());
}
