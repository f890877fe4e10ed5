//! Backend stores
//!
//! A store holds users, projects and stacks. `GlobalConfig` owns at most one
//! connected store and builds it through the `StoreRegistry`.

pub mod local;
pub mod registry;

pub use local::{LocalStore, LocalStoreFactory};
pub use registry::{StoreFactory, StoreRegistry};

use crate::config::store_config::{StoreConfig, StoreType};
use crate::primitives::StoreError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_USER_NAME: &str = "default";
pub const DEFAULT_PROJECT_NAME: &str = "default";
pub const DEFAULT_STACK_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the user agreed to share their email address
    #[serde(default)]
    pub email_opted_in: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: Uuid,
    pub name: String,
    /// Owning project
    pub project: Uuid,
}

/// Identity and deployment details of a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub id: Uuid,
    pub version: String,
    pub deployment_type: String,
    pub database_type: String,
}

/// Live connection to a backend store
pub trait StoreBackend: Send {
    /// Effective configuration, which may differ from the one requested
    fn config(&self) -> &StoreConfig;

    fn store_type(&self) -> StoreType {
        self.config().store_type
    }

    fn active_user(&self) -> Result<User, StoreError>;

    /// Look a project up by name or id
    fn get_project(&self, name_or_id: &str) -> Result<Project, StoreError>;

    fn get_stack(&self, id: Uuid) -> Result<Stack, StoreError>;

    fn default_project(&self) -> Result<Project, StoreError> {
        self.get_project(DEFAULT_PROJECT_NAME)
    }

    fn default_stack(&self, project: &Project) -> Result<Stack, StoreError>;

    fn get_store_info(&self) -> Result<StoreInfo, StoreError>;

    /// Check the active project and stack against this store
    ///
    /// Entries that no longer exist are replaced by the defaults. A stack
    /// that belongs to another project is replaced by that project's default.
    fn validate_active_config(
        &self,
        project_name: Option<&str>,
        stack_id: Option<Uuid>,
        config_name: &str,
    ) -> Result<(Project, Stack), StoreError> {
        let project = match project_name {
            Some(name) => match self.get_project(name) {
                Ok(project) => project,
                Err(e) if e.is_not_found() => {
                    let project = self.default_project()?;
                    warn!(
                        "The current {config_name} active project is no longer available. \
                         Resetting the active project to '{}'.",
                        project.name
                    );
                    project
                }
                Err(e) => return Err(e),
            },
            None => {
                let project = self.default_project()?;
                info!(
                    "Setting the {config_name} active project to '{}'.",
                    project.name
                );
                project
            }
        };

        let stack = match stack_id {
            Some(id) => match self.get_stack(id) {
                Ok(stack) if stack.project == project.id => stack,
                Ok(_) => {
                    warn!(
                        "The current {config_name} active stack is not part of the active \
                         project. Resetting the active stack to default."
                    );
                    self.default_stack(&project)?
                }
                Err(e) if e.is_not_found() => {
                    warn!(
                        "The current {config_name} active stack is no longer available. \
                         Resetting the active stack to default."
                    );
                    self.default_stack(&project)?
                }
                Err(e) => return Err(e),
            },
            None => {
                info!("Setting the {config_name} active stack to default.");
                self.default_stack(&project)?
            }
        };

        Ok((project, stack))
    }
}
