//! Fuzz target for the password session state machine
//!
//! Drives `PasswordSession` with arbitrary operation sequences and checks the
//! emitted actions against the session's own view of itself.
//!
//! # Strategy
//!
//! - Bootstrap from arbitrary persisted snapshots at arbitrary times
//! - Interleaved waits, submissions, cancels, clears and invalidations
//! - Submissions against a small password pool so matches happen often
//! - Shutdown at arbitrary points
//!
//! # Invariants
//!
//! - Every registered waiter is released exactly once
//! - A verified session has no pending waiters
//! - Published password and prompt values track the session state
//! - A password is adopted only after its fingerprint was persisted
//! - Abandoned waiters are never released afterwards
//! - Bootstrap decides once

#![no_main]

use std::{collections::HashSet, time::Duration};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use passgate_core::{PersistedSession, Timestamp};
use passgate_crypto::{PasswordHash, hash_password};
use passgate_session::{
    PasswordSession, SessionAction, Verification, WaitOutcome, WaitStart, WaiterId,
};

const PASSWORDS: [&str; 3] = ["alpha", "beta", "gamma"];
const WINDOW: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, Arbitrary)]
struct SessionScenario {
    stored: Option<u8>,
    last_checked_millis: Option<u32>,
    operations: Vec<SessionOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum SessionOperation {
    Bootstrap { now_millis: u32 },
    BeginWait,
    Submit { password: u8, now_millis: u32, persist_fails: bool },
    Abandon { index: u8 },
    Clear,
    Invalidate,
    Cancel,
    Shutdown,
}

struct Observer {
    registered: HashSet<WaiterId>,
    released: HashSet<WaiterId>,
    stored: PersistedSession,
    published_password: Option<PasswordHash>,
    published_prompt: bool,
}

impl Observer {
    fn apply(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::PersistFingerprint { hash, checked_at } => {
                    self.stored =
                        PersistedSession { stored_hash: Some(hash), last_checked_at: Some(checked_at) };
                },
                SessionAction::ClearPersisted => self.stored = PersistedSession::default(),
                SessionAction::ReleaseWaiters { waiters, outcome } => {
                    if let WaitOutcome::Verified(hash) = &outcome {
                        assert_eq!(self.published_password.as_ref(), Some(hash));
                    }
                    for id in waiters {
                        assert!(self.registered.contains(&id), "released unknown waiter");
                        assert!(self.released.insert(id), "waiter released twice");
                    }
                },
                SessionAction::PublishPassword(hash) => {
                    assert_ne!(self.published_password, hash, "unchanged password published");
                    if hash.is_some() {
                        // Only a persisted fingerprint is ever adopted
                        assert_eq!(self.stored.stored_hash, hash);
                    }
                    self.published_password = hash;
                },
                SessionAction::PublishPrompt(raised) => {
                    assert_ne!(self.published_prompt, raised, "unchanged prompt published");
                    self.published_prompt = raised;
                },
            }
        }
    }
}

fn pick(index: u8) -> &'static str {
    PASSWORDS[usize::from(index) % PASSWORDS.len()]
}

fuzz_target!(|scenario: SessionScenario| {
    let initial = PersistedSession {
        stored_hash: scenario.stored.map(|i| hash_password(pick(i))),
        last_checked_at: scenario.last_checked_millis.map(|ms| Timestamp::from_millis(ms.into())),
    };

    let mut session = PasswordSession::new();
    let mut observer = Observer {
        registered: HashSet::new(),
        released: HashSet::new(),
        stored: initial,
        published_password: None,
        published_prompt: false,
    };
    let mut decision = None;

    for op in scenario.operations {
        let actions = match op {
            SessionOperation::Bootstrap { now_millis } => {
                let now = Timestamp::from_millis(now_millis.into());
                let snapshot = observer.stored.clone();
                let (made, actions) = session.bootstrap(&snapshot, now, WINDOW);
                assert_eq!(*decision.get_or_insert(made), made, "bootstrap decided twice");
                actions
            },
            SessionOperation::BeginWait => {
                let (start, actions) = session.begin_wait();
                match start {
                    WaitStart::Ready(hash) => {
                        assert_eq!(observer.published_password.as_ref(), Some(&hash));
                    },
                    WaitStart::Pending(id) => {
                        assert!(observer.registered.insert(id), "waiter id reused");
                    },
                }
                actions
            },
            SessionOperation::Submit { password, now_millis } => {
                let now = Timestamp::from_millis(now_millis.into());
                let stored = observer.stored.stored_hash.clone();
                let (verification, actions) =
                    session.submit_password(pick(password), stored.as_ref(), now);
                match verification {
                    Verification::Accepted(_) if persist_fails => {
                        // The runtime adopts nothing when the write fails
                        assert!(matches!(
                            actions.as_slice(),
                            [SessionAction::PersistFingerprint { .. }]
                        ));
                        Vec::new()
                    },
                    Verification::Accepted(hash) => {
                        observer.apply(actions);
                        session.commit_password(hash)
                    },
                    Verification::Rejected => actions,
                }
            },
            SessionOperation::Abandon { index } => {
                let mut waiting: Vec<WaiterId> =
                    observer.registered.difference(&observer.released).copied().collect();
                waiting.sort();
                match waiting.get(usize::from(index) % waiting.len().max(1)) {
                    Some(&id) => {
                        observer.released.insert(id);
                        session.abandon_wait(id)
                    },
                    None => Vec::new(),
                }
            },
            SessionOperation::Clear => session.clear(),
            SessionOperation::Invalidate => session.invalidate(),
            SessionOperation::Cancel => session.cancel(),
            SessionOperation::Shutdown => session.shutdown(),
        };

        observer.apply(actions);

        assert_eq!(observer.published_password.as_ref(), session.current_hash());
        assert_eq!(observer.published_prompt, session.prompt_requested());
        assert_eq!(
            session.pending_waiters(),
            observer.registered.len() - observer.released.len()
        );
        if session.is_verified() {
            assert_eq!(session.pending_waiters(), 0, "verified with pending waiters");
        }
    }

    observer.apply(session.shutdown());
    assert_eq!(observer.registered, observer.released, "waiter never released");
});
