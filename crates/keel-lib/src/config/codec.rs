//! Reading and writing `config.yaml`

use crate::config::CONFIG_FILE_NAME;
use crate::config::settings::GlobalSettings;
use crate::primitives::ConfigError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Path of the settings file inside a configuration directory
pub fn config_file(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the raw key/value mapping, `None` if the file does not exist
pub fn read_config(path: &Path) -> Result<Option<Map<String, Value>>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Some(Map::new()));
    }

    let value: Value = serde_saphyr::from_str(&content).map_err(|e| ConfigError::ParseYaml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(Some(Map::new())),
        other => Err(ConfigError::ParseYaml {
            path: path.to_path_buf(),
            reason: format!("expected a mapping at the top level, found {other}"),
        }),
    }
}

/// Write the full settings document, creating the directory if needed
pub fn write_config(path: &Path, settings: &GlobalSettings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let yaml = serde_saphyr::to_string(&settings.to_values()?).map_err(|e| {
        ConfigError::SerializeYaml {
            reason: e.to_string(),
        }
    })?;

    tracing::debug!(path = %path.display(), "Writing config");
    fs::write(path, yaml).map_err(|source| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    include!("codec.test.rs");
}
