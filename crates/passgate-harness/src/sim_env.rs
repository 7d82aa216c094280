//! Simulated environment: virtual wall clock and seeded RNG.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use passgate_core::{Environment, Timestamp};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 2024-01-01T00:00:00Z, the default start of simulated time.
pub const SIM_EPOCH: Timestamp = Timestamp::from_millis(1_704_067_200_000);

/// Deterministic environment for tests.
///
/// Time only moves when the test moves it. Randomness comes from a ChaCha RNG
/// seeded at construction, so a seed reproduces every salt and nonce. Clones
/// share the clock and the RNG.
#[derive(Clone)]
pub struct SimEnv {
    clock: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Environment starting at [`SIM_EPOCH`] with the given RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock: Arc::new(AtomicU64::new(SIM_EPOCH.as_millis())),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Jump the clock to `now`. Moving backwards is allowed.
    pub fn set_now(&self, now: Timestamp) {
        self.clock.store(now.as_millis(), Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let now = self.now().saturating_add(duration);
        self.set_now(now);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.clock.load(Ordering::SeqCst))
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_moves_only_when_told() {
        let env = SimEnv::with_seed(1);
        assert_eq!(env.now(), SIM_EPOCH);

        env.advance(Duration::from_secs(90));
        assert_eq!(env.now(), SIM_EPOCH.saturating_add(Duration::from_secs(90)));

        env.set_now(Timestamp::from_millis(5));
        assert_eq!(env.now(), Timestamp::from_millis(5));
    }

    #[test]
    fn clones_share_clock() {
        let env = SimEnv::with_seed(1);
        let clone = env.clone();

        clone.advance(Duration::from_millis(10));
        assert_eq!(env.now(), clone.now());
    }

    #[test]
    fn same_seed_same_bytes() {
        let a: [u8; 32] = SimEnv::with_seed(42).random_array();
        let b: [u8; 32] = SimEnv::with_seed(42).random_array();
        let c: [u8; 32] = SimEnv::with_seed(43).random_array();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
