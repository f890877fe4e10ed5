//! Mock stores and a recording analytics sink

use crate::analytics::{AnalyticsEvent, AnalyticsGroup, AnalyticsSink, Metadata};
use crate::config::store_config::StoreConfig;
use crate::primitives::StoreError;
use crate::store::registry::StoreFactory;
use crate::store::{
    DEFAULT_PROJECT_NAME, DEFAULT_STACK_NAME, Project, Stack, StoreBackend, StoreInfo, User,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Calls observed across every store built by one factory
#[derive(Debug, Clone, Default)]
pub struct MockStoreCounters {
    pub created: Arc<Mutex<usize>>,
    pub get_project: Arc<Mutex<usize>>,
    pub get_store_info: Arc<Mutex<usize>>,
    pub configs: Arc<Mutex<Vec<StoreConfig>>>,
}

impl MockStoreCounters {
    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }

    pub fn get_project(&self) -> usize {
        *self.get_project.lock().unwrap()
    }

    pub fn get_store_info(&self) -> usize {
        *self.get_store_info.lock().unwrap()
    }

    /// Configurations the factory was asked to build, in order
    pub fn configs(&self) -> Vec<StoreConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
struct MockStoreData {
    user: User,
    projects: Vec<Project>,
    stacks: Vec<Stack>,
    info: StoreInfo,
}

/// In-memory store with a default project and stack
#[derive(Debug)]
pub struct MockStore {
    config: StoreConfig,
    data: MockStoreData,
    counters: MockStoreCounters,
}

impl StoreBackend for MockStore {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn active_user(&self) -> Result<User, StoreError> {
        Ok(self.data.user.clone())
    }

    fn get_project(&self, name_or_id: &str) -> Result<Project, StoreError> {
        *self.counters.get_project.lock().unwrap() += 1;
        self.data
            .projects
            .iter()
            .find(|p| p.name == name_or_id || p.id.to_string() == name_or_id)
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
            .ok_or_else(|| StoreError::not_found("Stack", DEFAULT_STACK_NAME))
    }

    fn get_store_info(&self) -> Result<StoreInfo, StoreError> {
        *self.counters.get_store_info.lock().unwrap() += 1;
        Ok(self.data.info.clone())
    }
}

/// Builds `MockStore`s that share one data set and one set of counters
#[derive(Debug, Clone)]
pub struct MockStoreFactory {
    data: MockStoreData,
    counters: MockStoreCounters,
}

impl Default for MockStoreFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStoreFactory {
    pub fn new() -> Self {
        let project = Project {
            id: Uuid::new_v4(),
            name: DEFAULT_PROJECT_NAME.to_string(),
            description: String::new(),
        };
        let stack = Stack {
            id: Uuid::new_v4(),
            name: DEFAULT_STACK_NAME.to_string(),
            project: project.id,
        };
        Self {
            data: MockStoreData {
                user: User {
                    id: Uuid::new_v4(),
                    name: "default".to_string(),
                    email: None,
                    email_opted_in: false,
                },
                projects: vec![project],
                stacks: vec![stack],
                info: StoreInfo {
                    id: Uuid::new_v4(),
                    version: "0.4.0".to_string(),
                    deployment_type: "docker".to_string(),
                    database_type: "mysql".to_string(),
                },
            },
            counters: MockStoreCounters::default(),
        }
    }

    /// Active user who opted in to sharing `email`
    pub fn with_opted_in_user(mut self, email: &str) -> Self {
        self.data.user.email = Some(email.to_string());
        self.data.user.email_opted_in = true;
        self
    }

    /// Extra project with its own default stack
    pub fn with_project(mut self, name: &str) -> Self {
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
        };
        self.data.stacks.push(Stack {
            id: Uuid::new_v4(),
            name: DEFAULT_STACK_NAME.to_string(),
            project: project.id,
        });
        self.data.projects.push(project);
        self
    }

    pub fn counters(&self) -> MockStoreCounters {
        self.counters.clone()
    }

    pub fn store_info(&self) -> StoreInfo {
        self.data.info.clone()
    }

    pub fn project(&self, name: &str) -> Option<Project> {
        self.data.projects.iter().find(|p| p.name == name).cloned()
    }

    pub fn default_stack_of(&self, project_name: &str) -> Option<Stack> {
        let project = self.project(project_name)?;
        self.data
            .stacks
            .iter()
            .find(|s| s.project == project.id)
            .cloned()
    }
}

impl StoreFactory for MockStoreFactory {
    fn create(
        &self,
        config: &StoreConfig,
        _skip_default_registrations: bool,
    ) -> Result<Box<dyn StoreBackend>, StoreError> {
        *self.counters.created.lock().unwrap() += 1;
        self.counters.configs.lock().unwrap().push(config.clone());
        Ok(Box::new(MockStore {
            config: config.clone(),
            data: self.data.clone(),
            counters: self.counters.clone(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsCall {
    Event {
        event: AnalyticsEvent,
        properties: Option<Metadata>,
    },
    IdentifyUser {
        traits: Metadata,
    },
    IdentifyGroup {
        group: AnalyticsGroup,
        group_id: String,
        metadata: Metadata,
    },
}

/// Analytics sink that keeps every call for later assertions
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    calls: Mutex<Vec<AnalyticsCall>>,
}

impl RecordingAnalytics {
    pub fn calls(&self) -> Vec<AnalyticsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AnalyticsCall::Event { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn identified_users(&self) -> Vec<Metadata> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AnalyticsCall::IdentifyUser { traits } => Some(traits),
                _ => None,
            })
            .collect()
    }

    pub fn identified_groups(&self) -> Vec<(AnalyticsGroup, String, Metadata)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AnalyticsCall::IdentifyGroup {
                    group,
                    group_id,
                    metadata,
                } => Some((group, group_id, metadata)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track_event(&self, event: AnalyticsEvent, properties: Option<Metadata>) {
        self.calls
            .lock()
            .unwrap()
            .push(AnalyticsCall::Event { event, properties });
    }

    fn identify_user(&self, traits: Metadata) {
        self.calls
            .lock()
            .unwrap()
            .push(AnalyticsCall::IdentifyUser { traits });
    }

    fn identify_group(&self, group: AnalyticsGroup, group_id: &str, metadata: Metadata) {
        self.calls.lock().unwrap().push(AnalyticsCall::IdentifyGroup {
            group,
            group_id: group_id.to_string(),
            metadata,
        });
    }
}
