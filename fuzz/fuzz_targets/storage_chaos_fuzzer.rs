//! Fuzz target for the persisted session store under storage failures
//!
//! Wraps a `MemoryStore` in `ChaoticStore` and mixes session saves and
//! clears with raw writes of arbitrary text to the session keys.
//!
//! # Strategy
//!
//! - Variable failure rates (0% to 90%)
//! - Saves and clears that may fail between their two writes
//! - Arbitrary garbage written straight to the fingerprint and timestamp keys
//!
//! # Invariants
//!
//! - Loading NEVER panics, whatever the keys hold
//! - Garbage in the fingerprint key is reported as `Corrupted`, never trusted
//! - Garbage in the timestamp key reads as absent
//! - A save that returns Ok is exactly what the next load sees
//! - A clear that returns Ok leaves nothing behind

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use passgate_core::{
    KeyValueStore, LAST_CHECKED_KEY, MemoryStore, PASSWORD_KEY, PersistedSession, SessionStore,
    StorageError, Timestamp,
};
use passgate_crypto::hash_password;
use passgate_harness::ChaoticStore;

#[derive(Debug, Clone, Arbitrary)]
struct ChaosScenario {
    /// Seed for ChaoticStore RNG (deterministic failures)
    chaos_seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    operations: Vec<ChaosOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum ChaosOperation {
    /// Persist a verified fingerprint
    Save { password: String, checked_at: u64 },
    /// Remove both keys
    Clear,
    /// Write arbitrary text to the fingerprint key, bypassing the session store
    CorruptFingerprint { raw: String },
    /// Write arbitrary text to the timestamp key, bypassing the session store
    CorruptTimestamp { raw: String },
    /// Read back through the chaotic store
    Load,
}

fuzz_target!(|scenario: ChaosScenario| {
    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let memory = MemoryStore::new();
    let chaotic = ChaoticStore::with_seed(memory.clone(), failure_rate, scenario.chaos_seed);
    let store = SessionStore::new(chaotic);
    let reliable = SessionStore::new(memory.clone());

    for op in scenario.operations {
        match op {
            ChaosOperation::Save { password, checked_at } => {
                let hash = hash_password(&password);
                let checked_at = Timestamp::from_millis(checked_at);
                if store.save(&hash, checked_at).is_ok() {
                    assert_eq!(
                        reliable.load(),
                        Ok(PersistedSession {
                            stored_hash: Some(hash),
                            last_checked_at: Some(checked_at),
                        })
                    );
                }
            },
            ChaosOperation::Clear => {
                if store.clear().is_ok() {
                    assert!(memory.is_empty(), "clear left keys behind");
                }
            },
            ChaosOperation::CorruptFingerprint { raw } => {
                let _ = memory.set(PASSWORD_KEY, &raw);
            },
            ChaosOperation::CorruptTimestamp { raw } => {
                let _ = memory.set(LAST_CHECKED_KEY, &raw);
            },
            ChaosOperation::Load => match store.load() {
                Ok(_) | Err(StorageError::Io(_)) => {},
                Err(StorageError::Corrupted { key, .. }) => assert_eq!(key, PASSWORD_KEY),
            },
        }

        // Whatever the chaos did, a reliable read classifies the raw contents
        let raw_hash = memory.get(PASSWORD_KEY).ok().flatten();
        let raw_time = memory.get(LAST_CHECKED_KEY).ok().flatten();
        match reliable.load() {
            Ok(session) => {
                assert_eq!(session.stored_hash.is_some(), raw_hash.is_some());
                if session.last_checked_at.is_some() {
                    assert!(raw_time.is_some());
                }
            },
            Err(StorageError::Corrupted { key, .. }) => {
                assert_eq!(key, PASSWORD_KEY);
                assert!(raw_hash.is_some());
            },
            Err(e) => panic!("reliable store failed: {e}"),
        }
    }
});
