use super::*;
use crate::primitives::{LogFormat, LogLevel};
use clap::CommandFactory;

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_no_subcommand_is_allowed() {
    let config = CliConfig::try_parse_from(["keel"]).unwrap();
    assert!(config.command.is_none());
    assert_eq!(config.app_config.log_level, LogLevel::Warning);
}

#[test]
fn test_global_log_flags() {
    let config =
        CliConfig::try_parse_from(["keel", "--log-level", "DEBUG", "--log-format", "json"]).unwrap();
    assert_eq!(config.app_config.log_level, LogLevel::Debug);
    assert_eq!(config.app_config.log_format, LogFormat::Json);
}

#[test]
fn test_analytics_subcommands() {
    let config = CliConfig::try_parse_from(["keel", "analytics", "opt-out"]).unwrap();
    assert!(matches!(
        config.command,
        Some(Commands::Analytics {
            action: AnalyticsCommand::OptOut
        })
    ));
}

#[test]
fn test_config_set_arguments() {
    let config = CliConfig::try_parse_from([
        "keel",
        "config",
        "set",
        "--url",
        "http://host:8080",
        "--username",
        "default",
        "--project",
        "research",
    ])
    .unwrap();

    match config.command {
        Some(Commands::Config {
            action:
                ConfigCommand::Set {
                    url,
                    username,
                    password,
                    project,
                    local_store,
                },
        }) => {
            assert_eq!(url.as_deref(), Some("http://host:8080"));
            assert_eq!(username.as_deref(), Some("default"));
            assert_eq!(password, None);
            assert_eq!(project.as_deref(), Some("research"));
            assert!(!local_store);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_local_store_conflicts_with_url() {
    let result = CliConfig::try_parse_from([
        "keel",
        "config",
        "set",
        "--local-store",
        "--url",
        "http://host:8080",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_set_verbosity_takes_raw_value() {
    let config = CliConfig::try_parse_from(["keel", "logging", "set-verbosity", "LOUD"]).unwrap();
    assert!(matches!(
        config.command,
        Some(Commands::Logging {
            action: LoggingCommand::SetVerbosity { ref verbosity }
        }) if verbosity == "LOUD"
    ));
}
