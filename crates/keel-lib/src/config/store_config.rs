//! Backend store configuration
//!
//! A `StoreConfig` names the kind of backend and the parameters needed to
//! reach it. Only the configuration is persisted, never the connection.

use crate::config::STORE_ENV_PREFIX;
use crate::primitives::{ConfigError, impl_fromstr_for_value_enum};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FILE_SCHEME: &str = "file://";

/// Kind of backend a store configuration points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Store kept in a directory on the local filesystem
    Local,
    /// Relational database
    Sql,
    /// Remote server reached over HTTP
    Rest,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Local => "local",
            StoreType::Sql => "sql",
            StoreType::Rest => "rest",
        }
    }

    /// Infer the store type from a URL scheme
    ///
    /// `http`/`https` point at a server, `file://` or a bare path at a local
    /// store, and any other scheme (`sqlite`, `mysql`, ...) at a database.
    pub fn from_url(url: &str) -> Self {
        match url.split_once("://") {
            None => StoreType::Local,
            Some((scheme, _)) => match scheme.to_ascii_lowercase().as_str() {
                "file" => StoreType::Local,
                "http" | "https" => StoreType::Rest,
                _ => StoreType::Sql,
            },
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ValueEnum for StoreType {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Local, Self::Sql, Self::Rest]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Local => Some(clap::builder::PossibleValue::new("local").alias("file")),
            Self::Sql => Some(clap::builder::PossibleValue::new("sql").alias("sqlite")),
            Self::Rest => Some(clap::builder::PossibleValue::new("rest").alias("http")),
        }
    }
}

impl_fromstr_for_value_enum!(StoreType, "invalid store type");

/// How to reach and construct a backend store
///
/// Two configurations are equal iff the discriminator and every parameter
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    pub store_type: StoreType,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Type-specific parameters without a dedicated field
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Loose parameter set, as found in `KEEL_STORE_*` variables
#[derive(Debug, Deserialize)]
struct StoreParams {
    #[serde(rename = "type", default)]
    store_type: Option<StoreType>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl StoreConfig {
    pub fn new(store_type: StoreType, url: impl Into<String>) -> Self {
        Self {
            store_type,
            url: url.into(),
            username: None,
            password: None,
            extra: BTreeMap::new(),
        }
    }

    /// Configuration for a local store rooted at `path`
    pub fn local(path: &Path) -> Self {
        Self::new(StoreType::Local, format!("{FILE_SCHEME}{}", path.display()))
    }

    /// Configuration with the type inferred from the URL scheme
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(StoreType::from_url(&url), url)
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Build a configuration from `KEEL_STORE_*` variables
    ///
    /// Keys are stripped of the prefix and lower-cased. A missing `type` is
    /// inferred from the URL.
    pub fn from_env_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let params: StoreParams = envy::prefixed(STORE_ENV_PREFIX).from_iter(vars)?;
        let url = params
            .url
            .ok_or_else(|| ConfigError::validation("store.url", "missing store URL"))?;

        let config = Self {
            store_type: params
                .store_type
                .unwrap_or_else(|| StoreType::from_url(&url)),
            url,
            username: params.username,
            password: params.password,
            extra: params.extra,
        };
        config.validate()?;
        Ok(config)
    }

    /// Filesystem root of a local store, `None` for remote kinds
    pub fn local_path(&self) -> Option<PathBuf> {
        if self.store_type != StoreType::Local {
            return None;
        }
        let path = self.url.strip_prefix(FILE_SCHEME).unwrap_or(&self.url);
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::validation("store.url", "store URL must not be empty"));
        }
        if self.store_type == StoreType::Local && self.local_path().is_none() {
            return Err(ConfigError::validation(
                "store.url",
                format!("'{}' does not name a local path", self.url),
            ));
        }
        Ok(())
    }

    /// Parameters for display, with the password masked
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut lines = vec![
            ("type".to_string(), self.store_type.to_string()),
            ("url".to_string(), self.url.clone()),
        ];
        if let Some(username) = &self.username {
            lines.push(("username".to_string(), username.clone()));
        }
        if self.password.is_some() {
            lines.push(("password".to_string(), "********".to_string()));
        }
        for (key, value) in &self.extra {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push((key.clone(), value));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    include!("store_config.test.rs");
}
