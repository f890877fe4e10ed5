//! Environment variable overrides
//!
//! Overrides apply to reads only. They are never written back to
//! `config.yaml`, and a value that fails to parse is ignored.

use crate::config::ENV_PREFIX;
use crate::config::settings::{
    FIELD_ACTIVE_PROJECT_NAME, FIELD_ACTIVE_STACK_ID, FIELD_ANALYTICS_OPT_IN,
    FIELD_SCHEMA_VERSION, FIELD_SECRET_KEY, FIELD_STORE, FIELD_USER_EMAIL, FIELD_USER_ID,
    GlobalSettings, parse_version,
};
use crate::config::store_config::StoreConfig;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Source of environment variables
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    fn vars(&self) -> Vec<(String, String)>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars().collect()
    }
}

/// In-memory environment
///
/// Clones share the same variables, so a caller can keep a handle and
/// change values after passing a clone to a `GlobalConfig`.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// `user_email` -> `KEEL_USER_EMAIL`
pub fn env_var_name(field: &str) -> String {
    format!("{ENV_PREFIX}{}", field.to_uppercase())
}

/// Settings as seen by readers: stored values with valid overrides applied
pub fn resolve_settings(stored: &GlobalSettings, env: &dyn EnvSource) -> GlobalSettings {
    let mut view = stored.clone();

    if let Some(user_id) = override_value(env, FIELD_USER_ID, parse_uuid) {
        view.user_id = user_id;
    }
    if let Some(email) = override_value(env, FIELD_USER_EMAIL, |raw| Some(raw.to_string())) {
        view.user_email = Some(email);
    }
    if let Some(opt_in) = override_value(env, FIELD_ANALYTICS_OPT_IN, parse_bool) {
        view.analytics_opt_in = opt_in;
    }
    if let Some(version) = override_value(env, FIELD_SCHEMA_VERSION, |raw| {
        parse_version(raw).ok().map(|_| raw.to_string())
    }) {
        view.schema_version = Some(version);
    }
    if let Some(store) = override_value(env, FIELD_STORE, parse_store) {
        view.store_config = Some(store);
    }
    if let Some(stack_id) = override_value(env, FIELD_ACTIVE_STACK_ID, parse_uuid) {
        view.active_stack_id = Some(stack_id);
    }
    if let Some(project) = override_value(env, FIELD_ACTIVE_PROJECT_NAME, non_empty) {
        view.active_project_name = Some(project);
    }
    if let Some(key) = override_value(env, FIELD_SECRET_KEY, non_empty) {
        view.secret_key = key;
    }

    view
}

/// Parsed override for one field, `None` when unset or unparseable
pub fn override_value<T>(
    env: &dyn EnvSource,
    field: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let name = env_var_name(field);
    let raw = env.var(&name)?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        tracing::debug!(
            variable = %name,
            "Ignoring environment override that does not parse as '{field}'"
        );
    }
    parsed
}

/// Boolean spellings accepted for flags set through the environment
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_uuid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn non_empty(raw: &str) -> Option<String> {
    (!raw.trim().is_empty()).then(|| raw.to_string())
}

// JSON is valid YAML, so both spellings are accepted
fn parse_store(raw: &str) -> Option<StoreConfig> {
    serde_saphyr::from_str::<StoreConfig>(raw)
        .ok()
        .filter(|config| config.validate().is_ok())
}

#[cfg(test)]
mod tests {
    include!("env.test.rs");
}
