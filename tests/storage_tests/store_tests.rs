//! Tests for EntryStore
//!
//! These tests verify:
//! - get/post/patch/delete on raw entries
//! - Rejected writes leave no file behind
//! - Atomic writes and exclusive create
//! - Corrupt files surface as CorruptEntry

use std::fs;
use std::path::Path;
use std::sync::Arc;

use flatdb::codec::SENTINEL;
use flatdb::storage::{EntryStore, NoLock, StoreOptions};
use flatdb::{Entry, FlatDbError, Schema};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn entry(pairs: &[(&str, &str)]) -> Entry {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn open_store(dir: &Path, options: StoreOptions) -> EntryStore {
    EntryStore::open(
        "people",
        dir,
        Schema::new(["name", "age"]),
        options,
        Arc::new(NoLock),
    )
    .unwrap()
}

fn setup_store() -> (TempDir, EntryStore) {
    let temp = TempDir::new().unwrap();
    let store = open_store(temp.path(), StoreOptions::default());
    (temp, store)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("people");

    let store = open_store(&dir, StoreOptions::default());

    assert!(dir.is_dir());
    assert_eq!(store.dir(), dir.as_path());
    assert_eq!(store.name(), "people");
}

// =============================================================================
// Post / Get Tests
// =============================================================================

#[test]
fn test_post_then_get() {
    let (_temp, store) = setup_store();
    let alice = entry(&[("name", "Alice"), ("age", "30")]);

    let id = store.post(&alice).unwrap();

    assert_eq!(id, 1);
    assert_eq!(store.get(id).unwrap(), Some(alice));
}

#[test]
fn test_post_allocates_sequential_ids() {
    let (_temp, store) = setup_store();

    let a = store.post(&entry(&[("name", "A"), ("age", "1")])).unwrap();
    let b = store.post(&entry(&[("name", "B"), ("age", "2")])).unwrap();
    let c = store.post(&entry(&[("name", "C"), ("age", "3")])).unwrap();

    assert_eq!((a, b, c), (1, 2, 3));
}

#[test]
fn test_post_writes_decimal_file_name() {
    let (temp, store) = setup_store();

    store.post(&entry(&[("name", "Alice"), ("age", "30")])).unwrap();

    let raw = fs::read_to_string(temp.path().join("1")).unwrap();
    assert_eq!(raw, format!("{s}Alice{s}\n{s}30{s}", s = SENTINEL));
}

#[test]
fn test_get_missing_is_none() {
    let (_temp, store) = setup_store();

    assert_eq!(store.get(42).unwrap(), None);
}

#[test]
fn test_post_missing_field_writes_nothing() {
    let (temp, store) = setup_store();

    let result = store.post(&Entry::new());

    assert!(matches!(result, Err(FlatDbError::MissingField(f)) if f == "name"));
    assert!(file_names(temp.path()).is_empty());
}

#[test]
fn test_post_too_many_fields_writes_nothing() {
    let (temp, store) = setup_store();

    let result = store.post(&entry(&[("name", "A"), ("age", "1"), ("x", "y")]));

    assert!(matches!(result, Err(FlatDbError::TooManyFields { .. })));
    assert!(file_names(temp.path()).is_empty());
}

// =============================================================================
// Patch Tests
// =============================================================================

#[test]
fn test_patch_is_shallow_merge() {
    let (_temp, store) = setup_store();
    let id = store.post(&entry(&[("name", "Alice"), ("age", "30")])).unwrap();

    let merged = store.patch(id, &entry(&[("age", "31")])).unwrap();

    assert_eq!(merged, entry(&[("name", "Alice"), ("age", "31")]));
    assert_eq!(store.get(id).unwrap(), Some(merged));
}

#[test]
fn test_patch_missing_entry() {
    let (_temp, store) = setup_store();

    let result = store.patch(7, &entry(&[("age", "31")]));

    assert!(matches!(
        result,
        Err(FlatDbError::EntryNotFound { id: 7, .. })
    ));
}

#[test]
fn test_patch_unknown_field_leaves_entry_untouched() {
    let (_temp, store) = setup_store();
    let alice = entry(&[("name", "Alice"), ("age", "30")]);
    let id = store.post(&alice).unwrap();

    let result = store.patch(id, &entry(&[("email", "a@x")]));

    assert!(matches!(result, Err(FlatDbError::TooManyFields { .. })));
    assert_eq!(store.get(id).unwrap(), Some(alice));
}

#[test]
fn test_patch_empty_value_rejected() {
    let (_temp, store) = setup_store();
    let id = store.post(&entry(&[("name", "Alice"), ("age", "30")])).unwrap();

    let result = store.patch(id, &entry(&[("name", "")]));

    assert!(matches!(result, Err(FlatDbError::MissingField(_))));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_returns_entry_and_removes_file() {
    let (temp, store) = setup_store();
    let alice = entry(&[("name", "Alice"), ("age", "30")]);
    let id = store.post(&alice).unwrap();

    let removed = store.delete(id).unwrap();

    assert_eq!(removed, alice);
    assert!(!temp.path().join("1").exists());
    assert_eq!(store.get(id).unwrap(), None);
}

#[test]
fn test_delete_missing_entry() {
    let (_temp, store) = setup_store();

    let result = store.delete(3);

    assert!(matches!(
        result,
        Err(FlatDbError::EntryNotFound { id: 3, .. })
    ));
}

#[test]
fn test_ids_not_reused_below_max() {
    let (_temp, store) = setup_store();
    store.post(&entry(&[("name", "A"), ("age", "1")])).unwrap();
    store.post(&entry(&[("name", "B"), ("age", "2")])).unwrap();
    store.delete(1).unwrap();

    let id = store.post(&entry(&[("name", "C"), ("age", "3")])).unwrap();

    assert_eq!(id, 3);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_get_corrupt_file() {
    let (temp, store) = setup_store();
    fs::write(temp.path().join("1"), "no sentinels here").unwrap();

    let result = store.get(1);

    match result {
        Err(FlatDbError::CorruptEntry(reason)) => assert!(reason.starts_with("people/1")),
        other => panic!("expected CorruptEntry, got {:?}", other),
    }
}

#[test]
fn test_delete_corrupt_file_keeps_it() {
    let (temp, store) = setup_store();
    fs::write(temp.path().join("1"), "garbage").unwrap();

    assert!(matches!(store.delete(1), Err(FlatDbError::CorruptEntry(_))));
    assert!(temp.path().join("1").exists());
}

// =============================================================================
// Write Option Tests
// =============================================================================

#[test]
fn test_atomic_writes_leave_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let options = StoreOptions {
        atomic_writes: true,
        ..StoreOptions::default()
    };
    let store = open_store(temp.path(), options);

    let id = store.post(&entry(&[("name", "Alice"), ("age", "30")])).unwrap();
    store.patch(id, &entry(&[("age", "31")])).unwrap();

    assert_eq!(file_names(temp.path()), vec!["1".to_string()]);
    assert_eq!(store.get(id).unwrap().unwrap()["age"], "31");
}

#[test]
fn test_atomic_patch_missing_entry() {
    let temp = TempDir::new().unwrap();
    let options = StoreOptions {
        atomic_writes: true,
        ..StoreOptions::default()
    };
    let store = open_store(temp.path(), options);

    assert!(matches!(
        store.patch(1, &entry(&[("age", "31")])),
        Err(FlatDbError::EntryNotFound { .. })
    ));
    assert!(file_names(temp.path()).is_empty());
}

#[test]
fn test_exclusive_create_posts_normally() {
    for atomic_writes in [false, true] {
        let temp = TempDir::new().unwrap();
        let options = StoreOptions {
            atomic_writes,
            exclusive_create: true,
            ..StoreOptions::default()
        };
        let store = open_store(temp.path(), options);

        assert_eq!(store.post(&entry(&[("name", "A"), ("age", "1")])).unwrap(), 1);
        assert_eq!(store.post(&entry(&[("name", "B"), ("age", "2")])).unwrap(), 2);
        assert_eq!(file_names(temp.path()), vec!["1".to_string(), "2".to_string()]);
    }
}

#[test]
fn test_exclusive_create_reports_duplicate_id() {
    for atomic_writes in [false, true] {
        let temp = TempDir::new().unwrap();
        let options = StoreOptions {
            atomic_writes,
            exclusive_create: true,
            ..StoreOptions::default()
        };
        let store = open_store(temp.path(), options);

        // A directory named "1" is not an entry, so the allocator hands out 1,
        // but the name is taken
        fs::create_dir(temp.path().join("1")).unwrap();

        let result = store.post(&entry(&[("name", "A"), ("age", "1")]));

        assert!(matches!(result, Err(FlatDbError::DuplicateId(1))));
        assert!(temp.path().join("1").is_dir());
        assert_eq!(file_names(temp.path()), vec!["1".to_string()]);
    }
}

// =============================================================================
// Check Hook Tests
// =============================================================================

#[test]
fn test_failed_check_on_post_writes_nothing() {
    let (temp, store) = setup_store();

    let result = store.post_with(entry(&[("name", "Alice"), ("age", "30")]), |_| {
        Err::<(), _>(FlatDbError::Transform("rejected".to_string()))
    });

    assert!(matches!(result, Err(FlatDbError::Transform(_))));
    assert!(file_names(temp.path()).is_empty());
}

#[test]
fn test_failed_check_on_patch_keeps_stored_entry() {
    let (_temp, store) = setup_store();
    let original = entry(&[("name", "Alice"), ("age", "30")]);
    let id = store.post(&original).unwrap();

    let result = store.patch_with(id, &entry(&[("age", "31")]), |merged| {
        assert_eq!(merged["age"], "31");
        Err::<(), _>(FlatDbError::Transform("rejected".to_string()))
    });

    assert!(matches!(result, Err(FlatDbError::Transform(_))));
    assert_eq!(store.get(id).unwrap(), Some(original));
}

#[test]
fn test_failed_check_on_delete_keeps_entry() {
    let (_temp, store) = setup_store();
    let original = entry(&[("name", "Alice"), ("age", "30")]);
    let id = store.post(&original).unwrap();

    let result = store.delete_with(id, |_| {
        Err::<(), _>(FlatDbError::Transform("rejected".to_string()))
    });

    assert!(matches!(result, Err(FlatDbError::Transform(_))));
    assert_eq!(store.get(id).unwrap(), Some(original));
}

#[test]
fn test_patch_of_entry_removed_after_read_is_not_recreated() {
    for atomic_writes in [false, true] {
        let temp = TempDir::new().unwrap();
        let options = StoreOptions {
            atomic_writes,
            ..StoreOptions::default()
        };
        let store = open_store(temp.path(), options);
        let id = store.post(&entry(&[("name", "Alice"), ("age", "30")])).unwrap();
        let path = store.entry_path(id);

        // Simulates a concurrent delete landing between the read and the rewrite
        let result = store.patch_with(id, &entry(&[("age", "31")]), |merged| {
            fs::remove_file(&path).unwrap();
            Ok(merged)
        });

        assert!(
            matches!(result, Err(FlatDbError::EntryNotFound { id: 1, .. })),
            "atomic_writes = {}",
            atomic_writes
        );
        assert!(file_names(temp.path()).is_empty());
    }
}

#[test]
fn test_delete_of_entry_removed_after_read() {
    let (temp, store) = setup_store();
    let id = store.post(&entry(&[("name", "Alice"), ("age", "30")])).unwrap();
    let path = store.entry_path(id);

    let result = store.delete_with(id, |removed| {
        fs::remove_file(&path).unwrap();
        Ok(removed)
    });

    assert!(matches!(result, Err(FlatDbError::EntryNotFound { id: 1, .. })));
    assert!(file_names(temp.path()).is_empty());
}
