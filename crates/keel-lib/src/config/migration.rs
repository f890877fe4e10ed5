//! Schema version migration
//!
//! The stored `schema_version` only ever moves forward. A configuration
//! written by a newer release is left untouched.

use semver::Version;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No version was recorded; stamp the current one
    Initialized { to: Version },
    /// Stored version equals the running version
    UpToDate,
    /// Stored version is older; record the running version
    Migrated { from: Version, to: Version },
    /// Stored version is newer; keep it
    Downgrade { stored: Version, current: Version },
}

impl MigrationOutcome {
    pub fn plan(stored: Option<&Version>, current: &Version) -> Self {
        match stored {
            None => Self::Initialized {
                to: current.clone(),
            },
            Some(stored) if stored == current => Self::UpToDate,
            Some(stored) if stored < current => Self::Migrated {
                from: stored.clone(),
                to: current.clone(),
            },
            Some(stored) => Self::Downgrade {
                stored: stored.clone(),
                current: current.clone(),
            },
        }
    }

    /// Version to persist, if this outcome changes the stored one
    pub fn target(&self) -> Option<&Version> {
        match self {
            Self::Initialized { to } | Self::Migrated { to, .. } => Some(to),
            Self::UpToDate | Self::Downgrade { .. } => None,
        }
    }

    pub fn log(&self) {
        match self {
            Self::Initialized { to } => {
                tracing::info!("Initializing the global configuration version to {to}")
            }
            Self::UpToDate => tracing::debug!("Global configuration is up to date"),
            Self::Migrated { from, to } => {
                tracing::info!("Migrating the global configuration from version {from} to version {to}")
            }
            Self::Downgrade { stored, current } => tracing::error!(
                "The global configuration version ({stored}) is higher than the running \
                 version ({current}). Downgrading is not supported and may cause \
                 unexpected behavior. Upgrade keel to at least {stored} or reset the \
                 global configuration."
            ),
        }
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized { to } => write!(f, "initialized at {to}"),
            Self::UpToDate => write!(f, "up to date"),
            Self::Migrated { from, to } => write!(f, "migrated from {from} to {to}"),
            Self::Downgrade { stored, current } => {
                write!(f, "stored version {stored} is newer than {current}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[test]
    fn test_plan_covers_every_ordering() {
        let current = v("0.4.0");

        assert_eq!(
            MigrationOutcome::plan(None, &current),
            MigrationOutcome::Initialized { to: v("0.4.0") }
        );
        assert_eq!(
            MigrationOutcome::plan(Some(&v("0.4.0")), &current),
            MigrationOutcome::UpToDate
        );
        assert_eq!(
            MigrationOutcome::plan(Some(&v("0.3.9")), &current),
            MigrationOutcome::Migrated {
                from: v("0.3.9"),
                to: v("0.4.0")
            }
        );
        assert_eq!(
            MigrationOutcome::plan(Some(&v("1.0.0")), &current),
            MigrationOutcome::Downgrade {
                stored: v("1.0.0"),
                current: v("0.4.0")
            }
        );
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        let outcome = MigrationOutcome::plan(Some(&v("0.4.0-rc.1")), &v("0.4.0"));
        assert!(matches!(outcome, MigrationOutcome::Migrated { .. }));
    }

    #[test]
    fn test_only_forward_outcomes_have_a_target() {
        let current = v("0.4.0");
        assert_eq!(
            MigrationOutcome::plan(None, &current).target(),
            Some(&current)
        );
        assert_eq!(
            MigrationOutcome::plan(Some(&v("0.1.0")), &current).target(),
            Some(&current)
        );
        assert_eq!(MigrationOutcome::plan(Some(&current), &current).target(), None);
        assert_eq!(
            MigrationOutcome::plan(Some(&v("2.0.0")), &current).target(),
            None
        );
    }
}
