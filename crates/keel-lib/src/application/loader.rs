//! Process configuration loading
//!
//! `.env.local` and `.env` are read into the process environment before the
//! CLI is parsed, so their values act like exported variables.

use crate::primitives::ConfigError;

use super::{cli::CliConfig, config::AppConfig};

/// Env files loaded at startup, first one wins per variable
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Load env files, skipping the ones that do not exist
pub fn load_env_files(files: &[&str]) -> Result<(), ConfigError> {
    for env_file in files {
        match dotenvy::from_filename(env_file) {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::EnvFileError {
                    file: env_file.to_string(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

impl AppConfig {
    /// Load config: defaults -> .env -> env vars -> CLI
    pub fn load() -> Result<Self, ConfigError> {
        load_env_files(&ENV_FILES)?;
        let cli_config = CliConfig::load()?;
        Ok(Self::default().merge_with(cli_config.app_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{LogFormat, LogLevel, LogOutput};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_env_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.env");
        let missing = missing.to_str().unwrap();

        assert!(load_env_files(&[missing]).is_ok());
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.env");
        fs::write(&path, "KEEL_TEST_BROKEN='unterminated\n").unwrap();

        let error = load_env_files(&[path.to_str().unwrap()]).unwrap_err();
        assert!(matches!(error, ConfigError::EnvFileError { .. }));
    }

    #[test]
    fn test_merge_takes_non_default_values() {
        let base = AppConfig::default();
        let cli = AppConfig {
            log_level: LogLevel::Debug,
            log_format: LogFormat::Json,
            log_output: LogOutput::Stderr,
        };

        let merged = base.merge_with(cli);

        assert_eq!(merged.log_level, LogLevel::Debug);
        assert_eq!(merged.log_format, LogFormat::Json);
        assert_eq!(merged.log_output, LogOutput::Stderr);
    }
}
