//! The persisted settings document

use crate::config::store_config::StoreConfig;
use crate::primitives::ConfigError;
use rand::RngCore;
use semver::Version;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const FIELD_USER_ID: &str = "user_id";
pub const FIELD_USER_EMAIL: &str = "user_email";
pub const FIELD_ANALYTICS_OPT_IN: &str = "analytics_opt_in";
pub const FIELD_SCHEMA_VERSION: &str = "schema_version";
pub const FIELD_STORE: &str = "store";
pub const FIELD_ACTIVE_STACK_ID: &str = "active_stack_id";
pub const FIELD_ACTIVE_PROJECT_NAME: &str = "active_project_name";
pub const FIELD_SECRET_KEY: &str = "secret_key";

/// Every field name that can be overridden through the environment
pub const PUBLIC_FIELDS: &[&str] = &[
    FIELD_USER_ID,
    FIELD_USER_EMAIL,
    FIELD_ANALYTICS_OPT_IN,
    FIELD_SCHEMA_VERSION,
    FIELD_STORE,
    FIELD_ACTIVE_STACK_ID,
    FIELD_ACTIVE_PROJECT_NAME,
    FIELD_SECRET_KEY,
];

/// Global settings as stored in `config.yaml`
///
/// Unknown keys found in the file are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSettings {
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub analytics_opt_in: bool,
    pub schema_version: Option<String>,
    #[serde(rename = "store")]
    pub store_config: Option<StoreConfig>,
    pub active_stack_id: Option<Uuid>,
    pub active_project_name: Option<String>,
    pub secret_key: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            user_email: None,
            analytics_opt_in: true,
            schema_version: None,
            store_config: None,
            active_stack_id: None,
            active_project_name: None,
            secret_key: generate_secret_key(),
            extra: BTreeMap::new(),
        }
    }
}

/// Values supplied at construction time, applied over the file contents
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub analytics_opt_in: Option<bool>,
    pub schema_version: Option<String>,
    pub store_config: Option<StoreConfig>,
    pub active_stack_id: Option<Uuid>,
    pub active_project_name: Option<String>,
    pub secret_key: Option<String>,
}

impl GlobalSettings {
    /// Build settings from the raw key/value mapping read from disk
    ///
    /// Missing keys take their defaults; a key with the wrong shape fails
    /// with a validation error naming that key.
    pub fn from_values(mut values: Map<String, Value>) -> Result<Self, ConfigError> {
        let settings = Self {
            user_id: take(&mut values, FIELD_USER_ID)?.unwrap_or_else(Uuid::new_v4),
            user_email: take_string(&mut values, FIELD_USER_EMAIL)?,
            analytics_opt_in: take(&mut values, FIELD_ANALYTICS_OPT_IN)?.unwrap_or(true),
            schema_version: take_string(&mut values, FIELD_SCHEMA_VERSION)?,
            store_config: take(&mut values, FIELD_STORE)?,
            active_stack_id: take(&mut values, FIELD_ACTIVE_STACK_ID)?,
            active_project_name: take_string(&mut values, FIELD_ACTIVE_PROJECT_NAME)?,
            secret_key: take_string(&mut values, FIELD_SECRET_KEY)?
                .unwrap_or_else(generate_secret_key),
            extra: values.into_iter().collect(),
        };
        Ok(settings)
    }

    /// Key/value form written to disk
    pub fn to_values(&self) -> Result<Value, ConfigError> {
        serde_json::to_value(self).map_err(|e| ConfigError::SerializeYaml {
            reason: e.to_string(),
        })
    }

    /// Apply construction overrides; only `Some` values replace stored ones
    pub fn merge_with(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(user_id) = overrides.user_id {
            self.user_id = user_id;
        }
        if let Some(email) = overrides.user_email {
            self.user_email = Some(email);
        }
        if let Some(opt_in) = overrides.analytics_opt_in {
            self.analytics_opt_in = opt_in;
        }
        if let Some(version) = overrides.schema_version {
            self.schema_version = Some(version);
        }
        if let Some(store) = overrides.store_config {
            self.store_config = Some(store);
        }
        if let Some(stack_id) = overrides.active_stack_id {
            self.active_stack_id = Some(stack_id);
        }
        if let Some(project) = overrides.active_project_name {
            self.active_project_name = Some(project);
        }
        if let Some(key) = overrides.secret_key {
            self.secret_key = key;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(version) = &self.schema_version {
            validate_version(version)?;
        }
        if self.secret_key.trim().is_empty() {
            return Err(ConfigError::validation(
                FIELD_SECRET_KEY,
                "secret key must not be empty",
            ));
        }
        if let Some(name) = &self.active_project_name {
            if name.trim().is_empty() {
                return Err(ConfigError::validation(
                    FIELD_ACTIVE_PROJECT_NAME,
                    "project name must not be empty",
                ));
            }
        }
        if let Some(store) = &self.store_config {
            store.validate()?;
        }
        Ok(())
    }
}

fn take<T: DeserializeOwned>(
    values: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<T>, ConfigError> {
    match values.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ConfigError::validation(field, e.to_string())),
    }
}

// YAML reads `0.20` or `1234` as numbers; string fields accept them verbatim
fn take_string(values: &mut Map<String, Value>, field: &str) -> Result<Option<String>, ConfigError> {
    match values.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(value.to_string())),
        Some(other) => Err(ConfigError::validation(
            field,
            format!("expected a string, found {other}"),
        )),
    }
}

/// 32 random bytes, hex encoded
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Parse a version string, padding missing minor/patch components
///
/// `0.20` is read as `0.20.0`, `2` as `2.0.0`.
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let raw = raw.trim();
    let core_end = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, rest) = raw.split_at(core_end);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => raw.to_string(),
    };
    Version::parse(&padded)
}

pub(crate) fn validate_version(raw: &str) -> Result<Version, ConfigError> {
    parse_version(raw).map_err(|e| {
        ConfigError::validation(
            FIELD_SCHEMA_VERSION,
            format!("'{raw}' is not a valid version: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    include!("settings.test.rs");
}
