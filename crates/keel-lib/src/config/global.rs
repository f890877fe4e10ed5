//! The global configuration object
//!
//! `GlobalConfig` owns the stored settings for one configuration directory.
//! Reads resolve environment overrides; writes update the stored value and
//! rewrite `config.yaml` immediately.

use crate::analytics::{
    AnalyticsEvent, AnalyticsEventSource, AnalyticsGroup, AnalyticsSink, LogAnalytics, Metadata,
    metadata,
};
use crate::config::codec;
use crate::config::env::{EnvSource, ProcessEnv, resolve_settings};
use crate::config::migration::MigrationOutcome;
use crate::config::settings::{GlobalSettings, SettingsOverrides, parse_version, validate_version};
use crate::config::store_config::{StoreConfig, StoreType};
use crate::config::{
    APP_NAME, APP_VERSION, CONFIG_PATH_ENV, DEFAULT_STORE_DIRECTORY_NAME,
    LOCAL_STORES_DIRECTORY_NAME, STORE_ENV_PREFIX,
};
use crate::primitives::ConfigError;
use crate::store::{Project, StoreBackend, StoreRegistry};
use directories::ProjectDirs;
use semver::Version;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Collaborators a `GlobalConfig` talks to
#[derive(Clone)]
pub struct ConfigContext {
    pub env: Arc<dyn EnvSource>,
    pub registry: Arc<StoreRegistry>,
    pub analytics: Arc<dyn AnalyticsSink>,
    /// Version compared against the stored `schema_version`
    pub app_version: Version,
}

impl Default for ConfigContext {
    fn default() -> Self {
        Self {
            env: Arc::new(ProcessEnv),
            registry: Arc::new(StoreRegistry::with_defaults()),
            analytics: Arc::new(LogAnalytics),
            app_version: parse_version(APP_VERSION).unwrap_or_else(|_| Version::new(0, 0, 0)),
        }
    }
}

impl ConfigContext {
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_registry(mut self, registry: StoreRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_app_version(mut self, version: Version) -> Self {
        self.app_version = version;
        self
    }

    /// `KEEL_CONFIG_PATH` if set, else the OS config directory for keel
    pub fn default_config_directory(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = self.env.var(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::ConfigDirUnavailable)
    }
}

impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("registry", &self.registry)
            .field("app_version", &self.app_version)
            .finish_non_exhaustive()
    }
}

pub struct GlobalConfig {
    settings: GlobalSettings,
    config_dir: PathBuf,
    pub(crate) context: ConfigContext,
    zen_store: Option<Box<dyn StoreBackend>>,
    active_project: Option<Project>,
}

impl fmt::Debug for GlobalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalConfig")
            .field("config_dir", &self.config_dir)
            .field("settings", &self.settings)
            .field("store_connected", &self.zen_store.is_some())
            .field("active_project", &self.active_project)
            .finish()
    }
}

impl GlobalConfig {
    /// Load the configuration kept in `config_dir`
    ///
    /// Missing keys take their defaults and `overrides` are applied on top.
    /// If `config.yaml` did not exist it is written before returning.
    pub fn load(
        config_dir: impl Into<PathBuf>,
        overrides: SettingsOverrides,
        context: ConfigContext,
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.into();
        let config_file = codec::config_file(&config_dir);
        let stored = codec::read_config(&config_file)?;
        let fresh = stored.is_none();

        let settings = GlobalSettings::from_values(stored.unwrap_or_default())?.merge_with(overrides);
        settings.validate()?;

        let config = Self {
            settings,
            config_dir,
            context,
            zen_store: None,
            active_project: None,
        };

        if fresh {
            debug!(
                path = %config_file.display(),
                "Creating global configuration"
            );
            config.persist()?;
        }
        Ok(config)
    }

    /// Load `config_dir` with the default collaborators
    pub fn open(config_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::load(config_dir, SettingsOverrides::default(), ConfigContext::default())
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    pub fn config_directory(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        codec::config_file(&self.config_dir)
    }

    /// Root for local stores owned by this configuration
    pub fn local_stores_path(&self) -> PathBuf {
        self.config_dir.join(LOCAL_STORES_DIRECTORY_NAME)
    }

    pub fn context(&self) -> &ConfigContext {
        &self.context
    }

    // ------------------------------------------------------------------
    // Reads (environment overrides applied)
    // ------------------------------------------------------------------

    /// Every field as a reader sees it
    pub fn settings(&self) -> GlobalSettings {
        resolve_settings(&self.settings, self.context.env.as_ref())
    }

    /// Stored values, without environment overrides
    pub fn stored_settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn user_id(&self) -> Uuid {
        self.settings().user_id
    }

    pub fn user_email(&self) -> Option<String> {
        self.settings().user_email
    }

    pub fn analytics_opt_in(&self) -> bool {
        self.settings().analytics_opt_in
    }

    pub fn schema_version(&self) -> Option<String> {
        self.settings().schema_version
    }

    pub fn store_config(&self) -> Option<StoreConfig> {
        self.settings().store_config
    }

    pub fn active_stack_id(&self) -> Option<Uuid> {
        self.settings().active_stack_id
    }

    pub fn active_project_name(&self) -> Option<String> {
        self.settings().active_project_name
    }

    pub fn secret_key(&self) -> String {
        self.settings().secret_key
    }

    // ------------------------------------------------------------------
    // Writes (persisted immediately)
    // ------------------------------------------------------------------

    /// Rewrite `config.yaml` from the stored settings
    pub fn persist(&self) -> Result<(), ConfigError> {
        codec::write_config(&self.config_file(), &self.settings)
    }

    /// Write the stored settings into another directory
    pub fn write_config_to(&self, config_dir: &Path) -> Result<(), ConfigError> {
        codec::write_config(&codec::config_file(config_dir), &self.settings)
    }

    pub fn set_analytics_opt_in(&mut self, opt_in: bool) -> Result<(), ConfigError> {
        self.settings.analytics_opt_in = opt_in;
        self.persist()
    }

    pub fn set_schema_version(&mut self, version: &str) -> Result<(), ConfigError> {
        validate_version(version)?;
        self.settings.schema_version = Some(version.to_string());
        self.persist()
    }

    pub fn set_active_stack_id(&mut self, stack_id: Option<Uuid>) -> Result<(), ConfigError> {
        self.settings.active_stack_id = stack_id;
        self.persist()
    }

    pub fn set_active_project_name(&mut self, name: Option<String>) -> Result<(), ConfigError> {
        if let Some(name) = &name {
            if name.trim().is_empty() {
                return Err(ConfigError::validation(
                    "active_project_name",
                    "project name must not be empty",
                ));
            }
        }
        self.settings.active_project_name = name;
        self.persist()
    }

    /// Store the configuration; a connected store built from a different
    /// configuration is dropped and rebuilt on next use
    pub fn set_store_config(&mut self, config: Option<StoreConfig>) -> Result<(), ConfigError> {
        if let Some(config) = &config {
            config.validate()?;
        }
        if self.settings.store_config != config {
            self.zen_store = None;
            self.active_project = None;
        }
        self.settings.store_config = config;
        self.persist()
    }

    /// Record the user's email, identifying the user once per new address
    ///
    /// An empty address is ignored.
    pub fn set_email_address(
        &mut self,
        email: &str,
        source: AnalyticsEventSource,
    ) -> Result<(), ConfigError> {
        if email.is_empty() {
            return Ok(());
        }
        if self.user_email().as_deref() != Some(email) {
            self.identify_user(metadata([("email", email), ("source", source.as_str())]));
        }
        self.settings.user_email = Some(email.to_string());
        self.persist()
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    /// Report an event, respecting the opt-in flag
    pub fn track_event(&self, event: AnalyticsEvent, properties: Option<Metadata>) {
        if event.bypasses_opt_in() || self.analytics_opt_in() {
            self.context.analytics.track_event(event, properties);
        }
    }

    fn identify_user(&self, traits: Metadata) {
        if self.analytics_opt_in() {
            self.context.analytics.identify_user(traits);
        }
    }

    fn identify_group(&self, group: AnalyticsGroup, group_id: &str, group_metadata: Metadata) {
        if self.analytics_opt_in() {
            self.context
                .analytics
                .identify_group(group, group_id, group_metadata);
        }
    }

    // ------------------------------------------------------------------
    // Store
    // ------------------------------------------------------------------

    /// Default store: `KEEL_STORE_*` variables if any are set, else a local
    /// store under `local_stores/default_store`
    pub fn get_default_store(&self) -> Result<StoreConfig, ConfigError> {
        let store_vars: Vec<(String, String)> = self
            .context
            .env
            .vars()
            .into_iter()
            .filter(|(key, value)| key.starts_with(STORE_ENV_PREFIX) && !value.is_empty())
            .collect();

        if !store_vars.is_empty() {
            debug!("Using environment variables to configure the default store");
            return StoreConfig::from_env_vars(store_vars);
        }

        Ok(self.context.registry.default_store_config(
            &self
                .local_stores_path()
                .join(DEFAULT_STORE_DIRECTORY_NAME),
        ))
    }

    /// Connect to the default store and make it the active one
    pub fn set_default_store(&mut self) -> Result<(), ConfigError> {
        let config = self.get_default_store()?;
        let store_type = config.store_type;
        self.configure_store(config, false)?;
        info!("Using the default store for the global config.");
        self.track_store_initialized(store_type);
        Ok(())
    }

    /// Connect to `config` and make it the active store
    ///
    /// Connecting to a server also registers this client in the server's
    /// analytics group.
    pub fn set_store(
        &mut self,
        config: StoreConfig,
        skip_default_registrations: bool,
    ) -> Result<(), ConfigError> {
        self.configure_store(config, skip_default_registrations)?;
        info!("Updated the global store configuration.");

        let store_type = self.zen_store()?.store_type();

        if store_type == StoreType::Rest {
            let info = self.zen_store()?.get_store_info()?;
            let server_id = info.id.to_string();
            let group_metadata = metadata([
                ("version", info.version.clone()),
                ("deployment_type", info.deployment_type.clone()),
                ("database_type", info.database_type.clone()),
            ]);
            self.identify_group(AnalyticsGroup::ServerGroup, &server_id, group_metadata.clone());

            let mut properties = group_metadata;
            properties.insert("server_id".to_string(), server_id.into());
            self.track_event(AnalyticsEvent::ServerConnected, Some(properties));
        }
        self.track_store_initialized(store_type);
        Ok(())
    }

    fn track_store_initialized(&self, store_type: StoreType) {
        self.track_event(
            AnalyticsEvent::InitializedStore,
            Some(metadata([("store_type", store_type.as_str())])),
        );
    }

    /// Build a store from `config` and adopt it unless an equivalent one is
    /// already connected
    pub(crate) fn configure_store(
        &mut self,
        config: StoreConfig,
        skip_default_registrations: bool,
    ) -> Result<(), ConfigError> {
        self.connect_store(config, skip_default_registrations, true)
    }

    /// Connect to `config`
    ///
    /// With `adopt` unset the connection is kept but nothing is written to
    /// the stored settings, as for a store named by `KEEL_STORE`.
    fn connect_store(
        &mut self,
        config: StoreConfig,
        skip_default_registrations: bool,
        adopt: bool,
    ) -> Result<(), ConfigError> {
        let store = self
            .context
            .registry
            .create_store(&config, skip_default_registrations)?;
        let effective = store.config().clone();

        if self.zen_store.is_some() && self.store_config().as_ref() == Some(&effective) {
            debug!("Store configuration unchanged, keeping the connected store");
            return Ok(());
        }

        let had_store = self.zen_store.is_some();
        if adopt && self.settings.store_config.as_ref() != Some(&effective) {
            self.settings.store_config = Some(effective);
            self.persist()?;
        }

        let active_user = store.active_user()?;
        if adopt && active_user.email_opted_in {
            if let Some(email) = active_user.email.as_deref() {
                let source = if had_store {
                    AnalyticsEventSource::Connect
                } else {
                    AnalyticsEventSource::ServerOptIn
                };
                self.set_email_address(email, source)?;
            }
        }

        self.zen_store = Some(store);
        self.sanitize_config(adopt)
    }

    /// Make sure the active project and stack exist in the connected store
    ///
    /// A selection that comes from an environment override is resolved but
    /// never stored.
    fn sanitize_config(&mut self, persist: bool) -> Result<(), ConfigError> {
        let project_name = self.active_project_name();
        let stack_id = self.active_stack_id();

        let (project, stack) = self.zen_store()?.validate_active_config(
            project_name.as_deref(),
            stack_id,
            "global",
        )?;

        let store_project = persist && self.settings.active_project_name == project_name;
        let store_stack = persist && self.settings.active_stack_id == stack_id;
        if store_project {
            self.settings.active_project_name = Some(project.name.clone());
        }
        if store_stack {
            self.settings.active_stack_id = Some(stack.id);
        }
        if store_project || store_stack {
            self.persist()?;
        }

        self.active_project = Some(project);
        Ok(())
    }

    /// The connected store, connecting on first use
    ///
    /// Without a store configuration the default store is set up first.
    pub fn zen_store(&mut self) -> Result<&dyn StoreBackend, ConfigError> {
        match self.store_config() {
            None => self.set_default_store()?,
            Some(config) if self.zen_store.is_none() => {
                let adopt = self.settings.store_config.as_ref() == Some(&config);
                self.connect_store(config, false, adopt)?
            }
            Some(_) => {}
        }

        self.zen_store
            .as_deref()
            .ok_or_else(|| ConfigError::Internal {
                reason: "store initialization did not produce a connection".to_string(),
            })
    }

    /// Whether a store connection exists, without connecting
    pub fn has_connected_store(&self) -> bool {
        self.zen_store.is_some()
    }

    // ------------------------------------------------------------------
    // Active project
    // ------------------------------------------------------------------

    pub fn set_active_project(&mut self, project: Project) -> Result<(), ConfigError> {
        self.settings.active_project_name = Some(project.name.clone());
        self.persist()?;
        self.active_project = Some(project);
        Ok(())
    }

    /// The active project, fetched once and then served from cache
    ///
    /// The cache is refetched when its name no longer matches
    /// `active_project_name`.
    pub fn active_project(&mut self) -> Result<Project, ConfigError> {
        let name = self
            .active_project_name()
            .ok_or(ConfigError::NoActiveProject)?;

        if let Some(project) = &self.active_project {
            if project.name == name {
                return Ok(project.clone());
            }
            debug!(cached = %project.name, active = %name, "Active project changed, refetching");
        }

        let project = self.zen_store()?.get_project(&name)?;
        self.active_project = Some(project.clone());
        Ok(project)
    }

    // ------------------------------------------------------------------
    // Migration and copying
    // ------------------------------------------------------------------

    /// Bring `schema_version` up to the running version, never down
    pub fn migrate(&mut self) -> Result<MigrationOutcome, ConfigError> {
        let stored = self
            .schema_version()
            .map(|raw| validate_version(&raw))
            .transpose()?;

        let outcome = MigrationOutcome::plan(stored.as_ref(), &self.context.app_version);
        outcome.log();

        if let Some(target) = outcome.target() {
            self.set_schema_version(&target.to_string())?;
        }
        Ok(outcome)
    }

    /// Copy this configuration into `config_path`
    ///
    /// The new configuration uses `store_config` when given. Otherwise a
    /// local store is copied next to it and referenced through
    /// `load_config_path` when that is where the copy will later be read
    /// from. The singleton is not affected.
    pub fn copy_configuration(
        &self,
        config_path: impl AsRef<Path>,
        load_config_path: Option<&Path>,
        store_config: Option<StoreConfig>,
    ) -> Result<GlobalConfig, ConfigError> {
        let config_path = config_path.as_ref();
        self.write_config_to(config_path)?;

        let mut copy =
            GlobalConfig::load(config_path, SettingsOverrides::default(), self.context.clone())?;

        let copied_store = match store_config {
            Some(config) => Some(config),
            None => match self.store_config() {
                Some(current) => Some(self.context.registry.copy_local_store(
                    &current,
                    config_path,
                    load_config_path,
                )?),
                None => None,
            },
        };
        if let Some(config) = copied_store {
            copy.set_store_config(Some(config))?;
        }

        debug!(
            from = %self.config_dir.display(),
            to = %config_path.display(),
            "Copied global configuration"
        );
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    include!("global.test.rs");
}
