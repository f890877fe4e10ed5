use super::*;

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_store_type_inferred_from_url_scheme() {
    assert_eq!(StoreType::from_url("http://host:8080"), StoreType::Rest);
    assert_eq!(StoreType::from_url("HTTPS://host"), StoreType::Rest);
    assert_eq!(StoreType::from_url("file:///tmp/store"), StoreType::Local);
    assert_eq!(StoreType::from_url("/tmp/store"), StoreType::Local);
    assert_eq!(StoreType::from_url("sqlite:///tmp/db.sqlite"), StoreType::Sql);
    assert_eq!(StoreType::from_url("mysql://user@host/db"), StoreType::Sql);
}

#[test]
fn test_store_type_parses_aliases() {
    assert_eq!("LOCAL".parse::<StoreType>().unwrap(), StoreType::Local);
    assert_eq!("http".parse::<StoreType>().unwrap(), StoreType::Rest);
    assert!("carrier-pigeon".parse::<StoreType>().is_err());
}

#[test]
fn test_local_config_points_at_path() {
    let config = StoreConfig::local(Path::new("/var/keel/default_store"));

    assert_eq!(config.store_type, StoreType::Local);
    assert_eq!(config.url, "file:///var/keel/default_store");
    assert_eq!(
        config.local_path(),
        Some(PathBuf::from("/var/keel/default_store"))
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_remote_config_has_no_local_path() {
    let config = StoreConfig::from_url("https://keel.example.com");
    assert_eq!(config.store_type, StoreType::Rest);
    assert_eq!(config.local_path(), None);
}

#[test]
fn test_validate_rejects_empty_url() {
    let config = StoreConfig::new(StoreType::Rest, "  ");
    let error = config.validate().unwrap_err();
    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "store.url"));
}

#[test]
fn test_equality_covers_every_parameter() {
    let a = StoreConfig::from_url("http://host:8080").with_credentials(Some("default".into()), None);
    let mut b = a.clone();
    assert_eq!(a, b);

    b.password = Some("secret".to_string());
    assert_ne!(a, b);

    let mut c = a.clone();
    c.extra
        .insert("verify_ssl".to_string(), serde_json::Value::Bool(false));
    assert_ne!(a, c);
}

#[test]
fn test_from_env_vars_infers_type_from_url() {
    let config = StoreConfig::from_env_vars(vars(&[
        ("KEEL_STORE_URL", "http://host:8080"),
        ("KEEL_STORE_USERNAME", "default"),
    ]))
    .unwrap();

    assert_eq!(config.store_type, StoreType::Rest);
    assert_eq!(config.url, "http://host:8080");
    assert_eq!(config.username.as_deref(), Some("default"));
    assert_eq!(config.password, None);
    assert!(config.extra.is_empty());
}

#[test]
fn test_from_env_vars_keeps_explicit_type_and_extra_params() {
    let config = StoreConfig::from_env_vars(vars(&[
        ("KEEL_STORE_TYPE", "sql"),
        ("KEEL_STORE_URL", "/data/keel.db"),
        ("KEEL_STORE_POOL_SIZE", "4"),
    ]))
    .unwrap();

    assert_eq!(config.store_type, StoreType::Sql);
    assert_eq!(
        config.extra.get("pool_size"),
        Some(&serde_json::Value::String("4".to_string()))
    );
}

#[test]
fn test_from_env_vars_requires_url() {
    let error = StoreConfig::from_env_vars(vars(&[("KEEL_STORE_USERNAME", "default")])).unwrap_err();
    assert!(matches!(error, ConfigError::Validation { ref field, .. } if field == "store.url"));
}

#[test]
fn test_yaml_shape_uses_type_key() {
    let config = StoreConfig::from_url("http://host:8080").with_credentials(Some("default".into()), None);
    let yaml = serde_saphyr::to_string(&config).unwrap();

    assert!(yaml.contains("type: rest"), "yaml was:\n{yaml}");
    assert!(!yaml.contains("password"));

    let parsed: StoreConfig = serde_saphyr::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_describe_masks_password() {
    let config = StoreConfig::from_url("http://host:8080")
        .with_credentials(Some("default".into()), Some("hunter2".into()));
    let lines = config.describe();

    assert!(lines.contains(&("password".to_string(), "********".to_string())));
    assert!(!lines.iter().any(|(_, v)| v == "hunter2"));
}
