use super::*;
use std::error::Error;

// =============================================================================
// LEVEL A: EXHAUSTIVE DATA TYPE TESTING
// =============================================================================

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let possible_value = variant.to_possible_value();
                assert!(
                    possible_value.is_some(),
                    "PossibleValue should exist for all variants"
                );

                let possible_val = possible_value.unwrap();
                let primary_name = possible_val.get_name();
                let parsed: Result<$enum_type, _> = primary_name.parse();
                assert_eq!(
                    parsed.unwrap(),
                    *variant,
                    "Primary name '{}' should round-trip",
                    primary_name
                );
            }
        }
    };
}

macro_rules! test_fromstr_aliases {
    ($enum_type:ty, $test_name:ident, $expected_mappings:expr) => {
        #[test]
        fn $test_name() {
            let mappings: &[(&str, $enum_type)] = &$expected_mappings;

            for (input, expected) in mappings {
                let parsed: Result<$enum_type, _> = input.parse();
                assert_eq!(
                    parsed.unwrap(),
                    *expected,
                    "Wrong variant for input '{}'",
                    input
                );
            }
        }
    };
}

test_enum_completeness!(LogLevel, test_log_level_completeness);
test_enum_completeness!(LogFormat, test_log_format_completeness);
test_enum_completeness!(LogOutput, test_log_output_completeness);

test_fromstr_aliases!(
    LogLevel,
    test_log_level_aliases,
    [
        ("error", LogLevel::Error),
        ("CRITICAL", LogLevel::Error),
        ("warn", LogLevel::Warning),
        ("WARNING", LogLevel::Warning),
        ("info", LogLevel::Info),
        ("Debug", LogLevel::Debug),
        ("trace", LogLevel::Trace),
        ("verbose", LogLevel::Trace),
    ]
);

test_fromstr_aliases!(
    LogFormat,
    test_log_format_aliases,
    [
        ("text", LogFormat::Text),
        ("plain", LogFormat::Text),
        ("json", LogFormat::Json),
        ("yml", LogFormat::Yaml),
    ]
);

// =============================================================================
// LEVEL B: COMPLEX IMPLEMENTATION BEHAVIORS/VALIDATIONS
// =============================================================================

#[test]
fn test_parse_verbosity_accepts_known_levels() {
    assert_eq!(LogLevel::parse_verbosity("DEBUG").unwrap(), LogLevel::Debug);
    assert_eq!(LogLevel::parse_verbosity("warn").unwrap(), LogLevel::Warning);
}

#[test]
fn test_parse_verbosity_lists_valid_values() {
    let error = LogLevel::parse_verbosity("LOUD").unwrap_err();

    match &error {
        ConfigError::UnsupportedVerbosity { value, valid } => {
            assert_eq!(value, "LOUD");
            assert_eq!(valid, &["ERROR", "WARN", "INFO", "DEBUG", "TRACE"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(error.to_string().contains("ERROR, WARN, INFO, DEBUG, TRACE"));
}

#[test]
fn test_config_error_display() {
    let error = ConfigError::validation("schema_version", "not a valid version: abc");
    assert_eq!(
        error.to_string(),
        "Invalid value for 'schema_version': not a valid version: abc"
    );

    let error = ConfigError::NoActiveProject;
    assert!(error.to_string().contains("keel config set --project PROJECT_NAME"));
}

#[test]
fn test_store_error_passes_through_config_error() {
    let error: ConfigError = StoreError::UnsupportedStoreType {
        store_type: "rest".to_string(),
        registered: vec!["local".to_string(), "sql".to_string()],
    }
    .into();

    assert_eq!(
        error.to_string(),
        "Unsupported store type 'rest'. Registered store types: local, sql"
    );
    assert!(matches!(error, ConfigError::Store(_)));
}

#[test]
fn test_io_errors_keep_their_source() {
    let error = ConfigError::WriteFile {
        path: PathBuf::from("/nope/config.yaml"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };

    assert!(error.source().is_some());
    assert!(error.to_string().contains("/nope/config.yaml"));
}
