//! Restart tests over `RedbStore`.
//!
//! A verified session written by one process must be trusted by the next
//! within the freshness window and prompt after it.

use std::{path::Path, time::Duration};

use passgate_core::{RedbStore, SessionConfig};
use passgate_crypto::{MIN_KDF_ROUNDS, hash_password};
use passgate_harness::SimEnv;
use passgate_session::{ArmoredCipher, BootstrapDecision, SessionManager};
use tempfile::tempdir;

const HOUR: Duration = Duration::from_secs(3600);

type Manager = SessionManager<RedbStore, ArmoredCipher<SimEnv>, SimEnv>;

fn open(path: &Path, env: &SimEnv) -> Manager {
    let store = RedbStore::open(path).unwrap();
    let cipher = ArmoredCipher::new(env.clone(), MIN_KDF_ROUNDS);
    let config = SessionConfig::default().with_kdf_rounds(MIN_KDF_ROUNDS);
    SessionManager::new(store, cipher, env.clone(), config)
}

#[tokio::test]
async fn test_trusted_then_expired_across_restarts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.redb");
    let env = SimEnv::with_seed(11);

    let armored = {
        let manager = open(&path, &env);
        assert_eq!(manager.bootstrap().unwrap(), BootstrapDecision::FirstRun);
        manager.set_password("master").unwrap();
        manager.encrypt_secret("api-token").await.unwrap()
    };

    env.advance(HOUR);
    {
        let manager = open(&path, &env);
        assert_eq!(manager.bootstrap().unwrap(), BootstrapDecision::Trusted);
        assert_eq!(*manager.password().borrow(), Some(hash_password("master")));
        assert_eq!(manager.decrypt_secret(&armored).await.unwrap(), "api-token");
    }

    env.advance(30 * HOUR);
    {
        let manager = open(&path, &env);
        assert_eq!(manager.bootstrap().unwrap(), BootstrapDecision::Expired);
        assert!(*manager.asking_for_password().borrow());

        manager.set_password("master").unwrap();
        assert_eq!(manager.decrypt_secret(&armored).await.unwrap(), "api-token");
    }

    // Re-entry refreshed the timestamp
    env.advance(HOUR);
    let manager = open(&path, &env);
    assert_eq!(manager.bootstrap().unwrap(), BootstrapDecision::Trusted);
}

#[tokio::test]
async fn test_lock_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.redb");
    let env = SimEnv::with_seed(12);

    {
        let manager = open(&path, &env);
        manager.set_password("master").unwrap();
        manager.clear_password().unwrap();
    }

    let manager = open(&path, &env);
    assert_eq!(manager.bootstrap().unwrap(), BootstrapDecision::FirstRun);
    assert!(!manager.is_verified());
}
