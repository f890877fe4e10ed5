//! Test support for keel
//!
//! Temporary config directories, in-memory environments, mock stores and an
//! analytics sink that records calls. Enabled for unit tests and through the
//! `test-utils` feature for the integration test crates.

pub mod filesystem;
pub mod mocks;

pub use filesystem::TempDirFixture;
pub use mocks::{AnalyticsCall, MockStore, MockStoreCounters, MockStoreFactory, RecordingAnalytics};

use crate::config::store_config::StoreType;
use crate::config::{ConfigContext, MapEnv};
use crate::store::StoreRegistry;
use std::sync::Arc;

/// Context wired to in-memory collaborators
///
/// The returned handles observe everything the configuration does with them.
pub fn recording_context(env: MapEnv) -> (ConfigContext, Arc<RecordingAnalytics>) {
    let analytics = Arc::new(RecordingAnalytics::default());
    let context = ConfigContext::default()
        .with_env(env)
        .with_analytics(analytics.clone());
    (context, analytics)
}

/// Registry with the local store plus a mock REST factory
pub fn registry_with_rest(factory: MockStoreFactory) -> StoreRegistry {
    StoreRegistry::with_defaults().with(StoreType::Rest, factory)
}
