use super::*;
use crate::config::store_config::StoreType;
use tempfile::TempDir;

fn open_in(temp: &TempDir) -> LocalStore {
    let config = StoreConfig::local(&temp.path().join("default_store"));
    LocalStore::open(&config, false).unwrap()
}

#[test]
fn test_open_creates_defaults_and_data_file() {
    let temp = TempDir::new().unwrap();
    let store = open_in(&temp);

    assert!(store.root().join(STORE_DATA_FILE).exists());
    assert_eq!(store.active_user().unwrap().name, DEFAULT_USER_NAME);

    let project = store.default_project().unwrap();
    assert_eq!(project.name, DEFAULT_PROJECT_NAME);

    let stack = store.default_stack(&project).unwrap();
    assert_eq!(stack.project, project.id);
}

#[test]
fn test_skip_default_registrations() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::local(&temp.path().join("bare"));
    let store = LocalStore::open(&config, true).unwrap();

    assert!(store.active_user().unwrap_err().is_not_found());
    assert!(store.default_project().unwrap_err().is_not_found());
}

#[test]
fn test_reopen_keeps_identity_and_entities() {
    let temp = TempDir::new().unwrap();
    let (store_id, project_id) = {
        let mut store = open_in(&temp);
        let project = store.create_project("research").unwrap();
        (store.get_store_info().unwrap().id, project.id)
    };

    let store = open_in(&temp);
    assert_eq!(store.get_store_info().unwrap().id, store_id);
    assert_eq!(store.get_project("research").unwrap().id, project_id);
    assert_eq!(
        store.get_project(&project_id.to_string()).unwrap().name,
        "research"
    );
}

#[test]
fn test_effective_config_matches_request() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::local(&temp.path().join("default_store"));
    let store = LocalStore::open(&config, false).unwrap();

    assert_eq!(store.config(), &config);
    assert_eq!(store.store_type(), StoreType::Local);
}

#[test]
fn test_remote_config_is_rejected() {
    let config = StoreConfig::from_url("http://host:8080");
    let error = LocalStore::open(&config, false).unwrap_err();
    assert!(matches!(error, StoreError::InvalidConfig { .. }));
}

#[test]
fn test_validate_active_config_resets_missing_entries() {
    let temp = TempDir::new().unwrap();
    let store = open_in(&temp);

    let (project, stack) = store
        .validate_active_config(Some("vanished"), Some(Uuid::new_v4()), "global")
        .unwrap();

    assert_eq!(project.name, DEFAULT_PROJECT_NAME);
    assert_eq!(stack, store.default_stack(&project).unwrap());
}

#[test]
fn test_validate_active_config_keeps_valid_entries() {
    let temp = TempDir::new().unwrap();
    let mut store = open_in(&temp);
    let project = store.create_project("research").unwrap();
    let stack = store.create_stack("gpu", &project).unwrap();

    let (active_project, active_stack) = store
        .validate_active_config(Some("research"), Some(stack.id), "global")
        .unwrap();

    assert_eq!(active_project, project);
    assert_eq!(active_stack, stack);
}

#[test]
fn test_validate_active_config_rejects_stack_from_other_project() {
    let temp = TempDir::new().unwrap();
    let mut store = open_in(&temp);
    let research = store.create_project("research").unwrap();
    let research_stack = store.create_stack("default", &research).unwrap();

    let (project, stack) = store
        .validate_active_config(Some(DEFAULT_PROJECT_NAME), Some(research_stack.id), "global")
        .unwrap();

    assert_eq!(project.name, DEFAULT_PROJECT_NAME);
    assert_ne!(stack.id, research_stack.id);
    assert_eq!(stack.project, project.id);
}

#[test]
fn test_copy_local_store_copies_directory() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let config = StoreConfig::local(&source.path().join("default_store"));
    let store_id = LocalStore::open(&config, false)
        .unwrap()
        .get_store_info()
        .unwrap()
        .id;

    let copied = LocalStoreFactory
        .copy_local_store(&config, target.path(), None)
        .unwrap();

    let expected = target.path().join("local_stores").join("default_store");
    assert_eq!(copied.local_path(), Some(expected.clone()));
    assert!(expected.join(STORE_DATA_FILE).exists());

    let reopened = LocalStore::open(&copied, false).unwrap();
    assert_eq!(reopened.get_store_info().unwrap().id, store_id);
}

#[test]
fn test_copy_local_store_points_at_load_path() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let config = StoreConfig::local(&source.path().join("default_store"));
    LocalStore::open(&config, false).unwrap();

    let copied = LocalStoreFactory
        .copy_local_store(&config, target.path(), Some(Path::new("/mnt/keel")))
        .unwrap();

    assert_eq!(
        copied.local_path(),
        Some(PathBuf::from("/mnt/keel/local_stores/default_store"))
    );
    assert!(
        target
            .path()
            .join("local_stores/default_store")
            .join(STORE_DATA_FILE)
            .exists()
    );
}

#[test]
fn test_delete_project_removes_its_stacks() {
    let temp = TempDir::new().unwrap();
    let mut store = open_in(&temp);
    let project = store.create_project("research").unwrap();
    let stack = store.create_stack("default", &project).unwrap();

    store.delete_project("research").unwrap();

    assert!(store.get_project("research").unwrap_err().is_not_found());
    assert!(store.get_stack(stack.id).unwrap_err().is_not_found());
}
