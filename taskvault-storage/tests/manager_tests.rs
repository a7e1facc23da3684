use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use taskvault_crypto::{EncryptionService, Keyring, KeyringConfig, Salt};
use taskvault_storage::{StorageError, TaskData, TaskManager, TaskStore, UserRecord};
use uuid::Uuid;

fn crypto(active: u32, generations: &[u32]) -> EncryptionService {
    let mut keys = HashMap::new();
    for &g in generations {
        keys.insert(g, STANDARD.encode([g as u8; 32]));
    }
    let config = KeyringConfig {
        active_generation: active,
        keys,
    };
    EncryptionService::new(Arc::new(Keyring::from_config(&config).unwrap()))
}

fn setup() -> (TaskStore, TaskManager, Uuid) {
    let store = TaskStore::open_in_memory().unwrap();
    let user = UserRecord {
        id: Uuid::new_v4(),
        email: "ada@example.com".into(),
        password_hash: "hash".into(),
        salt: Salt::random(),
        created_at: 0,
    };
    store.insert_user(&user).unwrap();
    let manager = TaskManager::new(store.clone(), crypto(1, &[1]));
    (store, manager, user.id)
}

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

fn sample_task() -> TaskData {
    TaskData {
        title: "Buy milk".into(),
        notes: Some("2 litres, oat".into()),
        deadline: Some(ts("2026-09-01T09:00:00Z")),
        completed_at: None,
        pinned: true,
        priority: 2,
    }
}

#[test]
fn create_and_get_roundtrip() {
    let (_store, manager, user) = setup();
    let data = sample_task();

    let task_id = manager.create_task(user, &data).unwrap();
    let loaded = manager.get_task(user, task_id).unwrap().unwrap();

    assert_eq!(loaded.id, task_id);
    assert_eq!(loaded.data, data);
}

#[test]
fn stored_fields_are_ciphertext() {
    let (store, manager, user) = setup();
    let task_id = manager.create_task(user, &sample_task()).unwrap();

    let record = store.task(user, task_id).unwrap().unwrap();
    assert_ne!(record.fields.title, "Buy milk");
    assert_ne!(record.fields.pinned, "1");
    assert_eq!(record.generation, 1);

    // Every column is a valid base64 envelope, not plaintext
    for column in [
        &record.fields.title,
        &record.fields.notes,
        &record.fields.deadline,
        &record.fields.completed_at,
        &record.fields.pinned,
        &record.fields.priority,
    ] {
        assert!(STANDARD.decode(column).unwrap().len() >= 28);
    }
}

#[test]
fn get_missing_returns_none() {
    let (_store, manager, user) = setup();
    assert!(manager.get_task(user, Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn list_tasks_decrypts_all() {
    let (_store, manager, user) = setup();

    let mut second = sample_task();
    second.title = "Walk the dog".into();
    second.notes = None;
    second.priority = 5;

    manager.create_task(user, &sample_task()).unwrap();
    manager.create_task(user, &second).unwrap();

    let tasks = manager.list_tasks(user).unwrap();
    assert_eq!(tasks.len(), 2);

    let titles: Vec<&str> = tasks.iter().map(|t| t.data.title.as_str()).collect();
    assert!(titles.contains(&"Buy milk"));
    assert!(titles.contains(&"Walk the dog"));
}

#[test]
fn optional_fields_roundtrip_as_none() {
    let (_store, manager, user) = setup();
    let data = TaskData {
        title: "Bare minimum".into(),
        notes: None,
        deadline: None,
        completed_at: None,
        pinned: false,
        priority: 0,
    };

    let task_id = manager.create_task(user, &data).unwrap();
    let loaded = manager.get_task(user, task_id).unwrap().unwrap();
    assert_eq!(loaded.data, data);
}

#[test]
fn update_replaces_values_at_active_generation() {
    let (store, manager, user) = setup();
    let task_id = manager.create_task(user, &sample_task()).unwrap();

    // A later deployment with generation 2 active updates the task
    let upgraded = TaskManager::new(store.clone(), crypto(2, &[1, 2]));
    let mut changed = sample_task();
    changed.title = "Buy oat milk".into();
    changed.completed_at = Some(ts("2026-08-30T18:00:00Z"));
    upgraded.update_task(user, task_id, &changed).unwrap();

    let record = store.task(user, task_id).unwrap().unwrap();
    assert_eq!(record.generation, 2);

    let loaded = upgraded.get_task(user, task_id).unwrap().unwrap();
    assert_eq!(loaded.data, changed);
}

#[test]
fn update_missing_task_fails() {
    let (_store, manager, user) = setup();
    let result = manager.update_task(user, Uuid::new_v4(), &sample_task());
    assert!(matches!(result, Err(StorageError::TaskNotFound(_))));
}

#[test]
fn delete_removes_task() {
    let (_store, manager, user) = setup();
    let task_id = manager.create_task(user, &sample_task()).unwrap();

    manager.delete_task(user, task_id).unwrap();
    assert!(manager.get_task(user, task_id).unwrap().is_none());
}

#[test]
fn create_for_unknown_user_fails() {
    let (_store, manager, _user) = setup();
    let result = manager.create_task(Uuid::new_v4(), &sample_task());
    assert!(matches!(result, Err(StorageError::UserNotFound(_))));
}

#[test]
fn sentinel_notes_value_rejected() {
    let (_store, manager, user) = setup();
    let mut data = sample_task();
    data.notes = Some("__NULL__".into());

    let result = manager.create_task(user, &data);
    assert!(matches!(
        result,
        Err(StorageError::Crypto(taskvault_crypto::CryptoError::SentinelCollision))
    ));
}

#[test]
fn other_user_cannot_read_task() {
    let (store, manager, user) = setup();
    let task_id = manager.create_task(user, &sample_task()).unwrap();

    let other = UserRecord {
        id: Uuid::new_v4(),
        email: "eve@example.com".into(),
        password_hash: "hash".into(),
        salt: Salt::random(),
        created_at: 0,
    };
    store.insert_user(&other).unwrap();

    assert!(manager.get_task(other.id, task_id).unwrap().is_none());
}

#[test]
fn corrupted_row_surfaces_error_not_none() {
    let (store, manager, user) = setup();
    let task_id = manager.create_task(user, &sample_task()).unwrap();

    let mut record = store.task(user, task_id).unwrap().unwrap();
    record.fields.title = "damaged!!".into();
    store.insert_task(&record).unwrap();

    let result = manager.get_task(user, task_id);
    assert!(matches!(result, Err(StorageError::Crypto(_))));
}
