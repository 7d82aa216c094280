//! Password session state machine.
//!
//! [`PasswordSession`] owns the in-memory half of the session: the verified
//! fingerprint, whether a prompt is raised, and which waiters are pending.
//! Every operation mutates that state and returns the [`SessionAction`]s the
//! runtime must execute (persist, release waiters, publish observables).
//!
//! This is a pure state machine - no I/O, no clocks, no channels. Time and the
//! persisted fingerprint are passed in by the caller.
//!
//! # States
//!
//! ```text
//!                    submit + commit
//!   ┌────────────┐ ───────────────────▶ ┌──────────┐
//!   │ Unverified │                      │ Verified │
//!   └────────────┘ ◀─────────────────── └──────────┘
//!     │      ▲      clear / invalidate
//!     │      │
//!     │ wait │ cancel / commit / abandon
//!     ▼      │
//!   ┌────────────┐
//!   │ Prompting  │ ── submit (mismatch) ──▶ stays Prompting
//!   └────────────┘
//! ```

use std::time::Duration;

use passgate_core::{PersistedSession, Timestamp};
use passgate_crypto::{PasswordHash, hash_password, verify_password};

use crate::SessionError;

/// Identifier of a pending wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(u64);

/// How a pending wait completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A password was verified.
    Verified(PasswordHash),
    /// The prompt was cancelled.
    Cancelled,
    /// The submitted password did not match.
    Mismatch,
    /// The session is shutting down.
    ShutDown,
}

impl WaitOutcome {
    /// Convert into what `wait_for_password` returns.
    pub fn into_result(self) -> Result<PasswordHash, SessionError> {
        match self {
            Self::Verified(hash) => Ok(hash),
            Self::Cancelled => Err(SessionError::Cancelled),
            Self::Mismatch => Err(SessionError::PasswordMismatch),
            Self::ShutDown => Err(SessionError::ShutDown),
        }
    }
}

/// What bootstrap concluded from the persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapDecision {
    /// Nothing persisted. The first password entered becomes the fingerprint.
    FirstRun,
    /// Verified recently enough; the persisted fingerprint is trusted.
    Trusted,
    /// Verified too long ago; the user is prompted immediately.
    Expired,
}

/// Result of starting a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStart {
    /// A verified password is already held.
    Ready(PasswordHash),
    /// The caller must wait for this waiter to be released.
    Pending(WaiterId),
}

/// Result of submitting a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The password matched (or established) the fingerprint.
    Accepted(PasswordHash),
    /// The password did not match the stored fingerprint.
    Rejected,
}

/// Side effects requested by [`PasswordSession`].
///
/// Actions are ordered: the runtime executes them front to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Write the fingerprint and verification time to storage.
    PersistFingerprint {
        /// Verified fingerprint
        hash: PasswordHash,
        /// Verification time
        checked_at: Timestamp,
    },

    /// Remove the fingerprint and verification time from storage.
    ClearPersisted,

    /// Complete every listed waiter with the same outcome.
    ReleaseWaiters {
        /// Waiters to complete, in registration order
        waiters: Vec<WaiterId>,
        /// Outcome delivered to each
        outcome: WaitOutcome,
    },

    /// The verified password changed.
    PublishPassword(Option<PasswordHash>),

    /// The prompt flag changed.
    PublishPrompt(bool),
}

/// In-memory password session.
#[derive(Debug, Default)]
pub struct PasswordSession {
    current_hash: Option<PasswordHash>,
    prompt_requested: bool,
    pending: Vec<WaiterId>,
    next_waiter: u64,
    bootstrap: Option<BootstrapDecision>,
}

impl PasswordSession {
    /// Create an unverified session with no prompt and no waiters.
    pub fn new() -> Self {
        Self::default()
    }

    /// The verified fingerprint, if any.
    pub fn current_hash(&self) -> Option<&PasswordHash> {
        self.current_hash.as_ref()
    }

    /// Whether a verified password is held.
    pub fn is_verified(&self) -> bool {
        self.current_hash.is_some()
    }

    /// Whether the UI has been asked for the password.
    pub fn prompt_requested(&self) -> bool {
        self.prompt_requested
    }

    /// Number of pending waiters.
    pub fn pending_waiters(&self) -> usize {
        self.pending.len()
    }

    /// Decision of the first bootstrap, if it ran.
    pub fn bootstrap_decision(&self) -> Option<BootstrapDecision> {
        self.bootstrap
    }

    /// Seed the session from persisted state.
    ///
    /// Only recency is checked; the fingerprint is not re-verified. Runs once:
    /// later calls return the first decision and no actions.
    pub fn bootstrap(
        &mut self,
        persisted: &PersistedSession,
        now: Timestamp,
        freshness_window: Duration,
    ) -> (BootstrapDecision, Vec<SessionAction>) {
        if let Some(decision) = self.bootstrap {
            return (decision, Vec::new());
        }

        let mut actions = Vec::new();
        let decision = match (&persisted.stored_hash, persisted.last_checked_at) {
            (Some(hash), Some(_)) if persisted.is_fresh(now, freshness_window) => {
                // Waits registered before bootstrap complete with the trusted hash
                self.set_current(Some(hash.clone()), &mut actions);
                self.set_prompt(false, &mut actions);
                self.release_all(WaitOutcome::Verified(hash.clone()), &mut actions);
                BootstrapDecision::Trusted
            },
            (Some(_), Some(_)) => {
                self.set_prompt(true, &mut actions);
                BootstrapDecision::Expired
            },
            _ => BootstrapDecision::FirstRun,
        };

        self.bootstrap = Some(decision);
        (decision, actions)
    }

    /// Start waiting for a verified password.
    ///
    /// Returns the held fingerprint immediately if verified. Otherwise
    /// registers a waiter and raises the prompt.
    pub fn begin_wait(&mut self) -> (WaitStart, Vec<SessionAction>) {
        if let Some(hash) = &self.current_hash {
            return (WaitStart::Ready(hash.clone()), Vec::new());
        }

        let id = WaiterId(self.next_waiter);
        self.next_waiter += 1;
        self.pending.push(id);

        let mut actions = Vec::new();
        self.set_prompt(true, &mut actions);
        (WaitStart::Pending(id), actions)
    }

    /// Submit a raw password against the persisted fingerprint.
    ///
    /// With no stored fingerprint any password is accepted and becomes the
    /// fingerprint. Acceptance only asks for the fingerprint to be persisted
    /// with `now`; nothing in memory changes until
    /// [`commit_password`](Self::commit_password) confirms the write. On
    /// rejection every pending waiter receives `Mismatch`; the held hash and
    /// the prompt are left as they were.
    pub fn submit_password(
        &mut self,
        raw: &str,
        stored: Option<&PasswordHash>,
        now: Timestamp,
    ) -> (Verification, Vec<SessionAction>) {
        let mut actions = Vec::new();

        if !verify_password(raw, stored) {
            self.release_all(WaitOutcome::Mismatch, &mut actions);
            return (Verification::Rejected, actions);
        }

        let hash = hash_password(raw);
        actions.push(SessionAction::PersistFingerprint { hash: hash.clone(), checked_at: now });
        (Verification::Accepted(hash), actions)
    }

    /// Adopt a fingerprint whose persistence succeeded.
    ///
    /// Lowers the prompt and releases every pending waiter with the hash.
    pub fn commit_password(&mut self, hash: PasswordHash) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        self.set_current(Some(hash.clone()), &mut actions);
        self.set_prompt(false, &mut actions);
        self.release_all(WaitOutcome::Verified(hash), &mut actions);
        actions
    }

    /// Forget a waiter whose caller stopped waiting.
    ///
    /// Unknown or already released ids are ignored. The prompt lowers when
    /// the last pending waiter goes away.
    pub fn abandon_wait(&mut self, id: WaiterId) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        let before = self.pending.len();
        self.pending.retain(|pending| *pending != id);

        if self.pending.len() < before && self.pending.is_empty() {
            self.set_prompt(false, &mut actions);
        }
        actions
    }

    /// Forget the password everywhere: storage and memory.
    pub fn clear(&mut self) -> Vec<SessionAction> {
        let mut actions = vec![SessionAction::ClearPersisted];
        self.set_current(None, &mut actions);
        actions
    }

    /// Drop only the in-memory verified hash. Storage is untouched.
    pub fn invalidate(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        self.set_current(None, &mut actions);
        actions
    }

    /// Reject every pending waiter with `Cancelled` and lower the prompt.
    pub fn cancel(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        self.release_all(WaitOutcome::Cancelled, &mut actions);
        self.set_prompt(false, &mut actions);
        actions
    }

    /// Reject every pending waiter with `ShutDown` and lower the prompt.
    pub fn shutdown(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        self.release_all(WaitOutcome::ShutDown, &mut actions);
        self.set_prompt(false, &mut actions);
        actions
    }

    fn release_all(&mut self, outcome: WaitOutcome, actions: &mut Vec<SessionAction>) {
        if self.pending.is_empty() {
            return;
        }
        let waiters = std::mem::take(&mut self.pending);
        actions.push(SessionAction::ReleaseWaiters { waiters, outcome });
    }

    fn set_current(&mut self, hash: Option<PasswordHash>, actions: &mut Vec<SessionAction>) {
        if self.current_hash != hash {
            self.current_hash = hash.clone();
            actions.push(SessionAction::PublishPassword(hash));
        }
    }

    fn set_prompt(&mut self, raised: bool, actions: &mut Vec<SessionAction>) {
        if self.prompt_requested != raised {
            self.prompt_requested = raised;
            actions.push(SessionAction::PublishPrompt(raised));
        }
    }
}
