use super::*;

#[test]
fn test_default_filter_scopes_keel_crates() {
    let filter = Logger::default_filter(LogLevel::Debug);
    assert_eq!(filter, "keel=debug,keel_lib=debug,warn");
}

#[test]
fn test_default_filter_parses() {
    for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
        let filter = Logger::default_filter(level);
        assert!(EnvFilter::try_new(&filter).is_ok(), "filter '{filter}'");
    }
}

#[test]
fn test_logger_not_initialized_initially() {
    // Other tests in this binary never install the global logger
    assert!(!Logger::is_initialized() || Logger::global().is_some());
}
