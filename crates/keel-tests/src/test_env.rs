//! Hermetic test environment for end-to-end configuration tests
//!
//! Every `TestEnvironment` owns a temporary configuration directory, an
//! in-memory environment and a recording analytics sink, so workflows run
//! without touching the user's real configuration or the process env.

use anyhow::Result;
use keel_lib::config::{ConfigContext, GlobalConfig, MapEnv, SettingsOverrides};
use keel_lib::store::StoreRegistry;
use keel_lib::testing::{MockStoreFactory, RecordingAnalytics, registry_with_rest};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnvironment {
    /// Temporary directory for the test environment
    pub temp_dir: TempDir,
    /// Directory holding `config.yaml`
    pub config_path: PathBuf,
    /// Variables visible to the configuration, shared with every loaded config
    pub env: MapEnv,
    /// Analytics calls made by configurations built from this environment
    pub analytics: Arc<RecordingAnalytics>,
    registry: StoreRegistry,
}

impl TestEnvironment {
    /// Environment with only the local store available
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config");
        Ok(Self {
            temp_dir,
            config_path,
            env: MapEnv::new(),
            analytics: Arc::new(RecordingAnalytics::default()),
            registry: StoreRegistry::with_defaults(),
        })
    }

    /// Environment where REST URLs connect to `factory`
    pub fn with_rest_store(factory: MockStoreFactory) -> Result<Self> {
        let mut test_env = Self::new()?;
        test_env.registry = registry_with_rest(factory);
        Ok(test_env)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A directory inside the environment, created if missing
    pub fn directory(&self, name: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Context wired to this environment's variables, registry and analytics
    pub fn context(&self) -> ConfigContext {
        ConfigContext::default()
            .with_env(self.env.clone())
            .with_registry(self.registry.clone())
            .with_analytics(self.analytics.clone())
    }

    /// Load the configuration in `config_path`
    pub fn load_config(&self) -> Result<GlobalConfig> {
        Ok(GlobalConfig::load(
            &self.config_path,
            SettingsOverrides::default(),
            self.context(),
        )?)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_path.join("config.yaml")
    }

    pub fn read_config_file(&self) -> Result<String> {
        Ok(fs::read_to_string(self.config_file())?)
    }

    pub fn write_config_file(&self, content: &str) -> Result<()> {
        fs::create_dir_all(&self.config_path)?;
        fs::write(self.config_file(), content)?;
        Ok(())
    }
}
