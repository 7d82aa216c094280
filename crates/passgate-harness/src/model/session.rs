//! Model session - the reference implementation.

use std::time::Duration;

use super::operation::{ModelPassword, Operation};

/// How a model wait completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModelOutcome {
    /// Resolved with this password.
    Verified(ModelPassword),
    /// Prompt cancelled.
    Cancelled,
    /// Wrong password submitted.
    Mismatch,
    /// Session restarted.
    ShutDown,
}

/// Result of applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,
    /// Password did not match the fingerprint.
    Mismatch,
    /// Decryption failed.
    DecryptFailed,
    /// Operation did not apply in this state.
    Skipped,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Verified in-memory password.
    pub current: Option<ModelPassword>,
    /// Whether the prompt is raised.
    pub prompt_requested: bool,
    /// Persisted fingerprint.
    pub stored: Option<ModelPassword>,
    /// Persisted verification time (epoch millis).
    pub last_checked_millis: Option<u64>,
    /// Number of pending waits.
    pub pending_waiters: usize,
}

/// Model session.
#[derive(Debug, Clone)]
pub struct SessionModel {
    now_millis: u64,
    freshness_window: Duration,
    stored: Option<ModelPassword>,
    last_checked_millis: Option<u64>,
    current: Option<ModelPassword>,
    prompt_requested: bool,
    pending_waiters: usize,
    outcomes: Vec<ModelOutcome>,
}

impl SessionModel {
    /// Fresh model with empty storage at `now_millis`.
    pub fn new(now_millis: u64, freshness_window: Duration) -> Self {
        Self {
            now_millis,
            freshness_window,
            stored: None,
            last_checked_millis: None,
            current: None,
            prompt_requested: false,
            pending_waiters: 0,
            outcomes: Vec::new(),
        }
    }

    /// Whether a password is verified in memory.
    pub fn is_verified(&self) -> bool {
        self.current.is_some()
    }

    /// Every wait outcome so far, sorted.
    pub fn outcomes(&self) -> Vec<ModelOutcome> {
        let mut outcomes = self.outcomes.clone();
        outcomes.sort();
        outcomes
    }

    /// Current observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            current: self.current,
            prompt_requested: self.prompt_requested,
            stored: self.stored,
            last_checked_millis: self.last_checked_millis,
            pending_waiters: self.pending_waiters,
        }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::SetPassword { password } => self.set_password(*password),
            Operation::ClearPassword => {
                self.stored = None;
                self.last_checked_millis = None;
                self.current = None;
                OperationResult::Ok
            },
            Operation::CancelPrompt => {
                self.release(ModelOutcome::Cancelled);
                self.prompt_requested = false;
                OperationResult::Ok
            },
            Operation::StartWait => {
                match self.current {
                    Some(password) => self.outcomes.push(ModelOutcome::Verified(password)),
                    None => {
                        self.pending_waiters += 1;
                        self.prompt_requested = true;
                    },
                }
                OperationResult::Ok
            },
            Operation::FailDecrypt => {
                if self.current.take().is_some() {
                    OperationResult::DecryptFailed
                } else {
                    OperationResult::Skipped
                }
            },
            Operation::AdvanceClock { hours } => {
                self.now_millis += u64::from(*hours) * 3_600_000;
                OperationResult::Ok
            },
            Operation::Restart => {
                self.restart();
                OperationResult::Ok
            },
        }
    }

    /// Complete all pending waits as the shutdown of the last session would.
    pub fn shutdown(&mut self) {
        self.release(ModelOutcome::ShutDown);
        self.prompt_requested = false;
    }

    fn set_password(&mut self, password: ModelPassword) -> OperationResult {
        if self.stored.is_some_and(|stored| stored != password) {
            self.release(ModelOutcome::Mismatch);
            return OperationResult::Mismatch;
        }

        self.stored = Some(password);
        self.last_checked_millis = Some(self.now_millis);
        self.current = Some(password);
        self.prompt_requested = false;
        self.release(ModelOutcome::Verified(password));
        OperationResult::Ok
    }

    fn restart(&mut self) {
        self.shutdown();
        self.current = None;

        let window = self.freshness_window.as_millis() as u64;
        if let (Some(stored), Some(checked)) = (self.stored, self.last_checked_millis) {
            if checked.saturating_add(window) >= self.now_millis {
                self.current = Some(stored);
            } else {
                self.prompt_requested = true;
            }
        }
    }

    fn release(&mut self, outcome: ModelOutcome) {
        for _ in 0..self.pending_waiters {
            self.outcomes.push(outcome);
        }
        self.pending_waiters = 0;
    }
}
