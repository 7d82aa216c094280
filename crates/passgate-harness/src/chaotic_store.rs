//! Chaotic storage wrapper for fault injection testing
//!
//! Storage wrapper that randomly fails operations to test error handling. Used
//! for chaos testing to verify the session never hangs a waiter or reports a
//! persisted state it did not write.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use passgate_core::{KeyValueStore, StorageError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chaotic storage wrapper that randomly injects failures
///
/// Delegates to an underlying store but fails operations with
/// `StorageError::Io` at a configured rate. The RNG is seeded so chaos runs
/// are reproducible; clones share it.
#[derive(Clone)]
pub struct ChaoticStore<S: KeyValueStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<ChaCha8Rng>>,
    operation_count: Arc<AtomicUsize>,
    failure_count: Arc<AtomicUsize>,
}

impl<S: KeyValueStore> ChaoticStore<S> {
    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    #[allow(clippy::panic)]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
            failure_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage operations attempted.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::SeqCst)
    }

    /// Number of operations that were failed on purpose.
    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::SeqCst)
    }

    fn inject(&self, op: &'static str, key: &str) -> Result<(), StorageError> {
        self.operation_count.fetch_add(1, Ordering::SeqCst);

        let fail = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_bool(self.failure_rate);
        if fail {
            self.failure_count.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(op, key, "injecting storage failure");
            return Err(StorageError::Io("chaotic failure injection".to_string()));
        }
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for ChaoticStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inject("get", key)?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inject("set", key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inject("remove", key)?;
        self.inner.remove(key)
    }
}
