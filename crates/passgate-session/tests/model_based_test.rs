//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! `SessionManager` behaves identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      SessionModel   RealSession     Compare
//!      (reference)    (tokio)         States
//! ```

use std::{sync::Arc, time::Duration};

use passgate_core::{Environment, MemoryStore, SessionConfig};
use passgate_crypto::{MIN_KDF_ROUNDS, PasswordHash};
use passgate_harness::{
    ModelOutcome, ModelPassword, ObservableState, Operation, OperationResult, SessionModel,
    SimEnv,
};
use passgate_session::{ArmoredCipher, SessionError, SessionManager};
use proptest::prelude::*;
use tokio::task::JoinSet;

type Manager = SessionManager<MemoryStore, ArmoredCipher<SimEnv>, SimEnv>;

const WINDOW: Duration = Duration::from_secs(24 * 3600);

/// Real system wrapper that mirrors `SessionModel`'s interface.
struct RealSession {
    env: SimEnv,
    store: MemoryStore,
    manager: Arc<Manager>,
    waits: JoinSet<Result<PasswordHash, SessionError>>,
    immediate: Vec<ModelOutcome>,
}

impl RealSession {
    fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let store = MemoryStore::new();
        let manager = Self::boot(&store, &env);
        Self { env, store, manager, waits: JoinSet::new(), immediate: Vec::new() }
    }

    fn boot(store: &MemoryStore, env: &SimEnv) -> Arc<Manager> {
        let config = SessionConfig::default()
            .with_freshness_window(WINDOW)
            .with_kdf_rounds(MIN_KDF_ROUNDS);
        let cipher = ArmoredCipher::new(env.clone(), MIN_KDF_ROUNDS);
        let manager = SessionManager::new(store.clone(), cipher, env.clone(), config);
        manager.bootstrap().unwrap();
        Arc::new(manager)
    }

    async fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::SetPassword { password } => {
                match self.manager.set_password(&password.raw()) {
                    Ok(()) => OperationResult::Ok,
                    Err(SessionError::PasswordMismatch) => OperationResult::Mismatch,
                    Err(e) => panic!("unexpected set_password error: {e:?}"),
                }
            },
            Operation::ClearPassword => {
                self.manager.clear_password().unwrap();
                OperationResult::Ok
            },
            Operation::CancelPrompt => {
                self.manager.cancel_asking_for_password();
                OperationResult::Ok
            },
            Operation::StartWait => {
                if self.manager.is_verified() {
                    let result = self.manager.wait_for_password().await;
                    self.immediate.push(to_outcome(result));
                } else {
                    let target = self.manager.pending_waiters() + 1;
                    let manager = Arc::clone(&self.manager);
                    self.waits.spawn(async move { manager.wait_for_password().await });
                    while self.manager.pending_waiters() < target {
                        tokio::task::yield_now().await;
                    }
                }
                OperationResult::Ok
            },
            Operation::FailDecrypt => {
                if !self.manager.is_verified() {
                    return OperationResult::Skipped;
                }
                match self.manager.decrypt_secret("garbage").await {
                    Ok(_) => OperationResult::Ok,
                    Err(_) => OperationResult::DecryptFailed,
                }
            },
            Operation::AdvanceClock { hours } => {
                self.env.advance(Duration::from_secs(u64::from(*hours) * 3600));
                OperationResult::Ok
            },
            Operation::Restart => {
                self.manager.teardown();
                self.manager = Self::boot(&self.store, &self.env);
                OperationResult::Ok
            },
        }
    }

    fn observable_state(&self) -> ObservableState {
        let persisted = self.manager.store().load().unwrap();
        let current = self.manager.password().borrow().clone();

        ObservableState {
            current: current.as_ref().and_then(ModelPassword::from_hash),
            prompt_requested: *self.manager.asking_for_password().borrow(),
            stored: persisted.stored_hash.as_ref().and_then(ModelPassword::from_hash),
            last_checked_millis: persisted.last_checked_at.map(|t| t.as_millis()),
            pending_waiters: self.manager.pending_waiters(),
        }
    }

    async fn finish(mut self) -> Vec<ModelOutcome> {
        self.manager.teardown();

        let mut outcomes = std::mem::take(&mut self.immediate);
        while let Some(joined) = self.waits.join_next().await {
            outcomes.push(to_outcome(joined.unwrap()));
        }
        outcomes.sort();
        outcomes
    }
}

fn to_outcome(result: Result<PasswordHash, SessionError>) -> ModelOutcome {
    match result {
        Ok(hash) => ModelOutcome::Verified(ModelPassword::from_hash(&hash).unwrap()),
        Err(SessionError::Cancelled) => ModelOutcome::Cancelled,
        Err(SessionError::PasswordMismatch) => ModelOutcome::Mismatch,
        Err(SessionError::ShutDown) => ModelOutcome::ShutDown,
        Err(e) => panic!("unexpected wait error: {e:?}"),
    }
}

/// Strategy for generating operations.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        // Weight towards the interesting interleavings
        4 => (0u8..3).prop_map(|i| Operation::SetPassword { password: ModelPassword::new(i) }),
        1 => Just(Operation::ClearPassword),
        2 => Just(Operation::CancelPrompt),
        4 => Just(Operation::StartWait),
        1 => Just(Operation::FailDecrypt),
        2 => (0u8..30).prop_map(|hours| Operation::AdvanceClock { hours }),
        1 => Just(Operation::Restart),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Verify that results and observable state match after every operation.
    #[test]
    fn prop_model_matches_real(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let runtime = runtime();
        runtime.block_on(async {
            let mut real = RealSession::new(seed);
            let mut model = SessionModel::new(real.env.now().as_millis(), WINDOW);

            for (i, op) in ops.iter().enumerate() {
                let model_result = model.apply(op);
                let real_result = real.apply(op).await;

                prop_assert_eq!(
                    model_result, real_result,
                    "Divergence at operation {}: {:?}", i, op
                );
                prop_assert_eq!(
                    model.observable_state(), real.observable_state(),
                    "State divergence after operation {}: {:?}", i, op
                );
            }

            model.shutdown();
            prop_assert_eq!(model.outcomes(), real.finish().await, "Wait outcome divergence");
            Ok(())
        })?;
    }

    /// No operation sequence leaves a verified session with the prompt raised.
    #[test]
    fn prop_verified_never_prompts(
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let mut model = SessionModel::new(0, WINDOW);

        for op in ops {
            let _ = model.apply(&op);
            let state = model.observable_state();
            prop_assert!(
                !(state.current.is_some() && (state.prompt_requested || state.pending_waiters > 0)),
                "prompt raised or waiters pending while verified: {:?}", state
            );
        }
    }
}

#[test]
fn model_basic_operations() {
    let runtime = runtime();
    runtime.block_on(async {
        let mut real = RealSession::new(1);
        let mut model = SessionModel::new(real.env.now().as_millis(), WINDOW);

        let ops = [
            Operation::StartWait,
            Operation::StartWait,
            Operation::SetPassword { password: ModelPassword::new(0) },
            Operation::SetPassword { password: ModelPassword::new(1) },
            Operation::FailDecrypt,
            Operation::StartWait,
            Operation::CancelPrompt,
            Operation::AdvanceClock { hours: 25 },
            Operation::Restart,
            Operation::StartWait,
        ];

        for op in &ops {
            assert_eq!(model.apply(op), real.apply(op).await, "{op:?}");
            assert_eq!(model.observable_state(), real.observable_state(), "{op:?}");
        }

        model.shutdown();
        assert_eq!(model.outcomes(), real.finish().await);
    });
}
