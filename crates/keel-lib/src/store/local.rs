//! Store kept as a YAML document in a local directory

use crate::config::store_config::StoreConfig;
use crate::config::{DEFAULT_STORE_DIRECTORY_NAME, LOCAL_STORES_DIRECTORY_NAME};
use crate::primitives::StoreError;
use crate::store::registry::StoreFactory;
use crate::store::{
    DEFAULT_PROJECT_NAME, DEFAULT_STACK_NAME, DEFAULT_USER_NAME, Project, Stack, StoreBackend,
    StoreInfo, User,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const STORE_DATA_FILE: &str = "store.yaml";

#[derive(Debug, Serialize, Deserialize)]
struct LocalStoreData {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    stacks: Vec<Stack>,
}

impl Default for LocalStoreData {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            users: Vec::new(),
            projects: Vec::new(),
            stacks: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct LocalStore {
    config: StoreConfig,
    root: PathBuf,
    data: LocalStoreData,
}

impl LocalStore {
    /// Open the store, creating its directory and data file on first use
    ///
    /// Unless `skip_default_registrations` is set, the default user, project
    /// and stack are created when missing.
    pub fn open(config: &StoreConfig, skip_default_registrations: bool) -> Result<Self, StoreError> {
        let root = config
            .local_path()
            .ok_or_else(|| StoreError::InvalidConfig {
                reason: format!("'{}' is not a local store URL", config.url),
            })?;

        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;

        let data_file = root.join(STORE_DATA_FILE);
        let data = if data_file.exists() {
            let content =
                fs::read_to_string(&data_file).map_err(|e| StoreError::io(&data_file, e))?;
            serde_saphyr::from_str(&content).map_err(|e| StoreError::Parse {
                path: data_file.clone(),
                reason: e.to_string(),
            })?
        } else {
            tracing::debug!(path = %root.display(), "Initializing local store");
            LocalStoreData::default()
        };

        let mut store = Self {
            config: config.clone(),
            root,
            data,
        };
        if !skip_default_registrations {
            store.register_defaults();
        }
        store.save()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create_project(&mut self, name: &str) -> Result<Project, StoreError> {
        if self.find_project(name).is_some() {
            return Err(StoreError::Backend {
                reason: format!("project '{name}' already exists"),
            });
        }
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
        };
        self.data.projects.push(project.clone());
        self.save()?;
        Ok(project)
    }

    pub fn create_stack(&mut self, name: &str, project: &Project) -> Result<Stack, StoreError> {
        let stack = Stack {
            id: Uuid::new_v4(),
            name: name.to_string(),
            project: project.id,
        };
        self.data.stacks.push(stack.clone());
        self.save()?;
        Ok(stack)
    }

    pub fn delete_project(&mut self, name: &str) -> Result<(), StoreError> {
        let project = self
            .find_project(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Project", name))?;
        self.data.projects.retain(|p| p.id != project.id);
        self.data.stacks.retain(|s| s.project != project.id);
        self.save()
    }

    fn register_defaults(&mut self) {
        if !self.data.users.iter().any(|u| u.name == DEFAULT_USER_NAME) {
            self.data.users.push(User {
                id: Uuid::new_v4(),
                name: DEFAULT_USER_NAME.to_string(),
                email: None,
                email_opted_in: false,
            });
        }

        let project_id = match self.find_project(DEFAULT_PROJECT_NAME) {
            Some(project) => project.id,
            None => {
                let project = Project {
                    id: Uuid::new_v4(),
                    name: DEFAULT_PROJECT_NAME.to_string(),
                    description: "Default project".to_string(),
                };
                let id = project.id;
                self.data.projects.push(project);
                id
            }
        };

        let has_default_stack = self
            .data
            .stacks
            .iter()
            .any(|s| s.project == project_id && s.name == DEFAULT_STACK_NAME);
        if !has_default_stack {
            self.data.stacks.push(Stack {
                id: Uuid::new_v4(),
                name: DEFAULT_STACK_NAME.to_string(),
                project: project_id,
            });
        }
    }

    fn find_project(&self, name_or_id: &str) -> Option<&Project> {
        let id = Uuid::parse_str(name_or_id).ok();
        self.data
            .projects
            .iter()
            .find(|p| p.name == name_or_id || Some(p.id) == id)
    }

    fn save(&self) -> Result<(), StoreError> {
        let path = self.root.join(STORE_DATA_FILE);
        let yaml = serde_saphyr::to_string(&self.data).map_err(|e| StoreError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, yaml).map_err(|e| StoreError::io(&path, e))
    }
}

impl StoreBackend for LocalStore {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn active_user(&self) -> Result<User, StoreError> {
        self.data
            .users
            .iter()
            .find(|u| u.name == DEFAULT_USER_NAME)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User", DEFAULT_USER_NAME))
    }

    fn get_project(&self, name_or_id: &str) -> Result<Project, StoreError> {
        self.find_project(name_or_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Project", name_or_id))
    }

    fn get_stack(&self, id: Uuid) -> Result<Stack, StoreError> {
        self.data
            .stacks
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Stack", id.to_string()))
    }

    fn default_stack(&self, project: &Project) -> Result<Stack, StoreError> {
        self.data
            .stacks
            .iter()
            .find(|s| s.project == project.id && s.name == DEFAULT_STACK_NAME)
            .cloned()
            .ok_or_else(|| {
                StoreError::not_found("Stack", format!("{DEFAULT_STACK_NAME} ({})", project.name))
            })
    }

    fn get_store_info(&self) -> Result<StoreInfo, StoreError> {
        Ok(StoreInfo {
            id: self.data.id,
            version: crate::config::APP_VERSION.to_string(),
            deployment_type: "local".to_string(),
            database_type: "yaml".to_string(),
        })
    }
}

/// Factory for `StoreType::Local`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStoreFactory;

impl StoreFactory for LocalStoreFactory {
    fn create(
        &self,
        config: &StoreConfig,
        skip_default_registrations: bool,
    ) -> Result<Box<dyn StoreBackend>, StoreError> {
        Ok(Box::new(LocalStore::open(config, skip_default_registrations)?))
    }

    /// Copies the store directory to `<config_path>/local_stores/<name>`
    fn copy_local_store(
        &self,
        config: &StoreConfig,
        config_path: &Path,
        load_config_path: Option<&Path>,
    ) -> Result<StoreConfig, StoreError> {
        let source = config
            .local_path()
            .ok_or_else(|| StoreError::InvalidConfig {
                reason: format!("'{}' is not a local store URL", config.url),
            })?;
        let name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_STORE_DIRECTORY_NAME.into());
        let relative = Path::new(LOCAL_STORES_DIRECTORY_NAME).join(name);

        let destination = config_path.join(&relative);
        if source.exists() {
            copy_dir(&source, &destination)?;
        }

        let load_root = load_config_path.unwrap_or(config_path);
        let mut copied = StoreConfig::local(&load_root.join(relative));
        copied.username = config.username.clone();
        copied.password = config.password.clone();
        copied.extra = config.extra.clone();
        Ok(copied)
    }
}

fn copy_dir(source: &Path, destination: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(destination).map_err(|e| StoreError::io(destination, e))?;

    for entry in fs::read_dir(source).map_err(|e| StoreError::io(source, e))? {
        let entry = entry.map_err(|e| StoreError::io(source, e))?;
        let from = entry.path();
        let to = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| StoreError::io(&from, e))?;

        if file_type.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| StoreError::io(&from, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("local.test.rs");
}
