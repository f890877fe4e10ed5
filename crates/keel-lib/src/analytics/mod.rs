//! Analytics sink
//!
//! The configuration manager reports a handful of events and identity
//! updates. Delivery is up to the sink; the default one only logs.

use serde_json::{Map, Value};
use std::fmt;

/// Free-form properties attached to an event or identity call
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsEvent {
    InitializedStore,
    ServerConnected,
    OptInAnalytics,
    OptOutAnalytics,
}

impl AnalyticsEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitializedStore => "Store initialized",
            Self::ServerConnected => "Server connected",
            Self::OptInAnalytics => "Analytics opt-in",
            Self::OptOutAnalytics => "Analytics opt-out",
        }
    }

    /// Opt-in/opt-out events are reported regardless of the opt-in flag
    pub fn bypasses_opt_in(&self) -> bool {
        matches!(self, Self::OptInAnalytics | Self::OptOutAnalytics)
    }
}

impl fmt::Display for AnalyticsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsGroup {
    /// All clients connected to the same server
    ServerGroup,
}

impl AnalyticsGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerGroup => "server_group",
        }
    }
}

/// Where an email address was supplied from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsEventSource {
    /// Connecting to a server for the first time in this process
    Connect,
    /// The server reported the user had opted in
    ServerOptIn,
}

impl AnalyticsEventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "keel connect",
            Self::ServerOptIn => "keel server",
        }
    }
}

impl fmt::Display for AnalyticsEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of analytics calls
///
/// Calls are fire-and-forget; a sink must not fail the caller.
pub trait AnalyticsSink: Send + Sync {
    fn track_event(&self, event: AnalyticsEvent, properties: Option<Metadata>);

    fn identify_user(&self, traits: Metadata);

    fn identify_group(&self, group: AnalyticsGroup, group_id: &str, metadata: Metadata);
}

/// Sink that records every call in the debug log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn track_event(&self, event: AnalyticsEvent, properties: Option<Metadata>) {
        tracing::debug!(
            target: "keel_lib::analytics",
            event = event.as_str(),
            properties = ?properties,
            "Tracking event"
        );
    }

    fn identify_user(&self, traits: Metadata) {
        tracing::debug!(target: "keel_lib::analytics", traits = ?traits, "Identifying user");
    }

    fn identify_group(&self, group: AnalyticsGroup, group_id: &str, metadata: Metadata) {
        tracing::debug!(
            target: "keel_lib::analytics",
            group = group.as_str(),
            group_id,
            metadata = ?metadata,
            "Identifying group"
        );
    }
}

/// Metadata from string pairs
pub fn metadata<I, K, V>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_opt_events_bypass_the_flag() {
        assert!(AnalyticsEvent::OptInAnalytics.bypasses_opt_in());
        assert!(AnalyticsEvent::OptOutAnalytics.bypasses_opt_in());
        assert!(!AnalyticsEvent::InitializedStore.bypasses_opt_in());
        assert!(!AnalyticsEvent::ServerConnected.bypasses_opt_in());
    }

    #[test]
    fn test_metadata_builder() {
        let meta = metadata([("email", "ada@example.com"), ("source", "keel connect")]);
        assert_eq!(meta["email"], Value::from("ada@example.com"));
        assert_eq!(meta.len(), 2);
    }
}
