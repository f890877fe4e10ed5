use super::*;
use crate::config::store_config::StoreConfig;
use tempfile::TempDir;

#[test]
fn test_missing_file_reads_as_none() {
    let temp = TempDir::new().unwrap();
    let result = read_config(&config_file(temp.path())).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_empty_file_reads_as_empty_mapping() {
    let temp = TempDir::new().unwrap();
    let path = config_file(temp.path());
    fs::write(&path, "\n").unwrap();

    assert_eq!(read_config(&path).unwrap(), Some(Map::new()));
}

#[test]
fn test_malformed_yaml_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = config_file(temp.path());
    fs::write(&path, "user_id: [unterminated\n").unwrap();

    let error = read_config(&path).unwrap_err();
    assert!(matches!(error, ConfigError::ParseYaml { .. }), "{error:?}");
}

#[test]
fn test_top_level_scalar_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = config_file(temp.path());
    fs::write(&path, "just a string\n").unwrap();

    let error = read_config(&path).unwrap_err();
    assert!(error.to_string().contains("expected a mapping"));
}

#[test]
fn test_write_creates_directory_and_reads_back() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp.path().join("nested").join("keel"));
    let settings = GlobalSettings {
        user_email: Some("ada@example.com".to_string()),
        schema_version: Some("0.4.0".to_string()),
        store_config: Some(StoreConfig::local(&temp.path().join("store"))),
        ..GlobalSettings::default()
    };

    write_config(&path, &settings).unwrap();
    assert!(path.exists());

    let loaded = GlobalSettings::from_values(read_config(&path).unwrap().unwrap()).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_write_keeps_unknown_keys() {
    let temp = TempDir::new().unwrap();
    let path = config_file(temp.path());
    fs::write(
        &path,
        "analytics_opt_in: false\nexperimental:\n  fast_paths: true\n",
    )
    .unwrap();

    let settings = GlobalSettings::from_values(read_config(&path).unwrap().unwrap()).unwrap();
    write_config(&path, &settings).unwrap();

    let raw = read_config(&path).unwrap().unwrap();
    assert_eq!(raw["analytics_opt_in"], Value::Bool(false));
    assert_eq!(raw["experimental"]["fast_paths"], Value::Bool(true));
}
