//! Crash recovery tests for `RedbStore`.
//!
//! These tests verify that persisted session fields survive database
//! close/reopen cycles, simulating process restarts.

use passgate_core::{
    KeyValueStore, LAST_CHECKED_KEY, PASSWORD_KEY, PersistedSession, RedbStore, SessionStore,
    StorageError, Timestamp,
};
use passgate_crypto::hash_password;
use tempfile::tempdir;

#[test]
fn test_session_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("session.redb");

    let hash = hash_password("correct horse battery staple");
    let checked_at = Timestamp::from_millis(1_700_000_000_000);

    // Persist, then simulate clean shutdown
    {
        let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
        store.save(&hash, checked_at).unwrap();
    }

    // Reopen and verify both fields exist
    {
        let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
        let loaded = store.load().unwrap();

        assert_eq!(loaded.stored_hash.as_ref(), Some(&hash));
        assert_eq!(loaded.last_checked_at, Some(checked_at));
    }
}

#[test]
fn test_clear_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("session.redb");

    {
        let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
        store.save(&hash_password("pw"), Timestamp::from_millis(1)).unwrap();
        store.clear().unwrap();
    }

    {
        let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
        assert_eq!(store.load().unwrap(), PersistedSession::default());
        assert_eq!(store.inner().get(PASSWORD_KEY).unwrap(), None);
        assert_eq!(store.inner().get(LAST_CHECKED_KEY).unwrap(), None);
    }
}

#[test]
fn test_resave_overwrites_previous_session() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("session.redb");

    {
        let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
        store.save(&hash_password("old"), Timestamp::from_millis(10)).unwrap();
        store.save(&hash_password("new"), Timestamp::from_millis(20)).unwrap();
    }

    let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
    let loaded = store.load().unwrap();
    assert_eq!(loaded.stored_hash, Some(hash_password("new")));
    assert_eq!(loaded.last_checked_at, Some(Timestamp::from_millis(20)));
}

#[test]
fn test_corrupted_fingerprint_on_disk() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("session.redb");

    {
        let raw = RedbStore::open(&db_path).unwrap();
        raw.set(PASSWORD_KEY, "zz").unwrap();
    }

    let store = SessionStore::new(RedbStore::open(&db_path).unwrap());
    let err = store.load().unwrap_err();
    assert!(matches!(err, StorageError::Corrupted { .. }));
    assert!(!err.is_transient());
}
