//! Session manager runtime.
//!
//! [`SessionManager`] wraps the pure [`PasswordSession`] with everything that
//! touches the outside world: the persisted session store, the clock, the
//! cipher, the waiter arena and the observable channels. Every public
//! operation takes one lock, runs one state transition, executes the
//! resulting actions and releases the lock before awaiting anything.

#![allow(clippy::disallowed_types, reason = "Lock is never held across an await")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use passgate_core::{Environment, KeyValueStore, SessionConfig, SessionStore, StorageError};
use passgate_crypto::PasswordHash;
use tokio::{
    sync::{broadcast, oneshot, watch},
    task::JoinHandle,
};

use crate::{
    BootstrapDecision, PasswordSession, RemoteEvent, SecretCipher, SessionAction, SessionError,
    Verification, WaitOutcome, WaitStart, WaiterId,
};

struct Inner {
    session: PasswordSession,
    waiters: HashMap<WaiterId, oneshot::Sender<WaitOutcome>>,
    shut_down: bool,
}

/// Password-gated session over a store, a cipher and an environment.
///
/// Shared as `Arc<SessionManager<..>>`. Nothing is read from storage until
/// [`bootstrap`](Self::bootstrap) runs.
pub struct SessionManager<S, C, E>
where
    S: KeyValueStore,
    C: SecretCipher,
    E: Environment,
{
    store: SessionStore<S>,
    cipher: C,
    env: E,
    config: SessionConfig,
    inner: Mutex<Inner>,
    password_tx: watch::Sender<Option<PasswordHash>>,
    prompt_tx: watch::Sender<bool>,
    remote_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S, C, E> SessionManager<S, C, E>
where
    S: KeyValueStore,
    C: SecretCipher,
    E: Environment,
{
    /// Create an unverified manager. No storage access happens here.
    pub fn new(store: S, cipher: C, env: E, config: SessionConfig) -> Self {
        let (password_tx, _) = watch::channel(None);
        let (prompt_tx, _) = watch::channel(false);

        Self {
            store: SessionStore::new(store),
            cipher,
            env,
            config,
            inner: Mutex::new(Inner {
                session: PasswordSession::new(),
                waiters: HashMap::new(),
                shut_down: false,
            }),
            password_tx,
            prompt_tx,
            remote_task: Mutex::new(None),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Persisted session store backing this manager.
    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Decide from storage whether the previous session is still trusted.
    ///
    /// Runs once; later calls return the first decision without reading
    /// storage again.
    pub fn bootstrap(&self) -> Result<BootstrapDecision, SessionError> {
        let mut inner = self.lock_inner()?;
        if let Some(decision) = inner.session.bootstrap_decision() {
            return Ok(decision);
        }

        let persisted = self.store.load()?;
        let now = self.env.now();
        let (decision, actions) =
            inner.session.bootstrap(&persisted, now, self.config.freshness_window);
        self.execute(&mut inner, actions)?;

        tracing::info!(?decision, last_checked_at = ?persisted.last_checked_at, "session bootstrapped");
        Ok(decision)
    }

    /// Submit the raw master password.
    ///
    /// The password is adopted only once its fingerprint is persisted, so
    /// the held hash always matches what storage holds.
    ///
    /// # Errors
    ///
    /// - `PasswordMismatch` if a fingerprint is stored and differs; pending
    ///   waiters are rejected and the prompt stays raised
    /// - `Storage` if the fingerprint could not be read or persisted; nothing
    ///   is adopted and pending waiters keep waiting for a retry
    pub fn set_password(&self, raw: &str) -> Result<(), SessionError> {
        let mut inner = self.lock_inner()?;

        let persisted = self.store.load()?;
        let now = self.env.now();
        let (verification, actions) =
            inner.session.submit_password(raw, persisted.stored_hash.as_ref(), now);

        match verification {
            Verification::Accepted(hash) => {
                self.execute(&mut inner, actions)?;
                let actions = inner.session.commit_password(hash.clone());
                self.release_only(&mut inner, actions);
                drop(inner);

                tracing::info!(
                    fingerprint = ?hash,
                    first_run = persisted.stored_hash.is_none(),
                    "password verified"
                );
                Ok(())
            },
            Verification::Rejected => {
                self.release_only(&mut inner, actions);
                drop(inner);

                tracing::warn!("password does not match stored fingerprint");
                Err(SessionError::PasswordMismatch)
            },
        }
    }

    /// Forget the password in storage and memory. Idempotent.
    pub fn clear_password(&self) -> Result<(), SessionError> {
        let mut inner = self.lock_inner()?;
        let actions = inner.session.clear();
        self.execute(&mut inner, actions)?;

        tracing::info!("password cleared");
        Ok(())
    }

    /// Reject every pending wait with `Cancelled` and lower the prompt.
    pub fn cancel_asking_for_password(&self) {
        let Ok(mut inner) = self.lock_inner() else {
            return;
        };
        let pending = inner.session.pending_waiters();
        let actions = inner.session.cancel();
        self.release_only(&mut inner, actions);

        tracing::debug!(pending, "password prompt cancelled");
    }

    /// The verified fingerprint, prompting the user if none is held.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the prompt is dismissed
    /// - `PasswordMismatch` if a wrong password is submitted meanwhile
    /// - `ShutDown` if the manager is torn down
    ///
    /// Dropping the future withdraws the wait; the prompt lowers once no
    /// caller is left waiting.
    pub async fn wait_for_password(&self) -> Result<PasswordHash, SessionError> {
        let (id, receiver) = {
            let mut inner = self.lock_inner()?;
            let (start, actions) = inner.session.begin_wait();
            match start {
                WaitStart::Ready(hash) => return Ok(hash),
                WaitStart::Pending(id) => {
                    let (tx, rx) = oneshot::channel();
                    inner.waiters.insert(id, tx);
                    self.release_only(&mut inner, actions);
                    tracing::debug!(waiter = ?id, "waiting for password");
                    (id, rx)
                },
            }
        };

        // Forgets the waiter if this future is dropped before completion
        let _guard = AbandonGuard { manager: self, id };

        // A dropped sender means the arena was discarded at teardown
        receiver.await.unwrap_or(WaitOutcome::ShutDown).into_result()
    }

    /// Encrypt a secret under the verified password.
    ///
    /// Waits for the password first. Wait and cipher errors propagate
    /// unchanged.
    pub async fn encrypt_secret(&self, plaintext: &str) -> Result<String, SessionError> {
        let hash = self.wait_for_password().await?;
        let armored = self.cipher.encrypt(plaintext, hash.as_str()).await?;
        Ok(armored)
    }

    /// Decrypt an armored secret under the verified password.
    ///
    /// Any failure drops the in-memory verified password before the error
    /// is returned, so the next operation prompts again. The persisted
    /// fingerprint is left alone.
    pub async fn decrypt_secret(&self, armored: &str) -> Result<String, SessionError> {
        let result = match self.wait_for_password().await {
            Ok(hash) => {
                self.cipher.decrypt(armored, hash.as_str()).await.map_err(SessionError::from)
            },
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, "decryption failed, dropping verified password");
            self.invalidate_password();
        }
        result
    }

    /// Observe the verified fingerprint.
    pub fn password(&self) -> watch::Receiver<Option<PasswordHash>> {
        self.password_tx.subscribe()
    }

    /// Observe whether the UI is being asked for the password.
    pub fn asking_for_password(&self) -> watch::Receiver<bool> {
        self.prompt_tx.subscribe()
    }

    /// Whether a verified password is held.
    pub fn is_verified(&self) -> bool {
        self.password_tx.borrow().is_some()
    }

    /// Number of callers currently suspended in `wait_for_password`.
    pub fn pending_waiters(&self) -> usize {
        lock(&self.inner).session.pending_waiters()
    }

    /// Clear the password whenever the remote session disconnects.
    ///
    /// Replaces any previous subscription. The task holds only a weak
    /// reference and ends when the channel closes, the manager is dropped,
    /// or [`teardown`](Self::teardown) runs.
    pub fn subscribe_remote_events(self: &Arc<Self>, mut events: broadcast::Receiver<RemoteEvent>) {
        let manager = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(RemoteEvent::Disconnected) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        tracing::info!("remote session disconnected");
                        if let Err(e) = manager.clear_password() {
                            tracing::error!(error = %e, "failed to clear password on disconnect");
                        }
                    },
                    Ok(RemoteEvent::Connected) => {
                        tracing::debug!("remote session connected");
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "remote event receiver lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = lock(&self.remote_task).replace(task) {
            previous.abort();
        }
    }

    /// Stop the remote subscription and reject every pending wait with
    /// `ShutDown`. Later operations fail with `ShutDown`.
    pub fn teardown(&self) {
        if let Some(task) = lock(&self.remote_task).take() {
            task.abort();
        }

        let mut inner = lock(&self.inner);
        if inner.shut_down {
            return;
        }
        inner.shut_down = true;

        let actions = inner.session.shutdown();
        self.release_only(&mut inner, actions);
        inner.waiters.clear();

        tracing::debug!("session manager torn down");
    }

    fn abandon_wait(&self, id: WaiterId) {
        let mut inner = lock(&self.inner);
        // Released waiters are already gone from the arena
        if inner.waiters.remove(&id).is_none() {
            return;
        }
        let actions = inner.session.abandon_wait(id);
        self.release_only(&mut inner, actions);

        tracing::debug!(waiter = ?id, "wait abandoned");
    }

    fn invalidate_password(&self) {
        let mut inner = lock(&self.inner);
        let actions = inner.session.invalidate();
        self.release_only(&mut inner, actions);
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner>, SessionError> {
        let inner = lock(&self.inner);
        if inner.shut_down {
            return Err(SessionError::ShutDown);
        }
        Ok(inner)
    }

    /// Execute actions that cannot touch storage.
    fn release_only(&self, inner: &mut Inner, actions: Vec<SessionAction>) {
        if let Err(e) = self.execute(inner, actions) {
            tracing::error!(error = %e, "unexpected storage failure");
        }
    }

    /// Execute actions in order.
    ///
    /// A storage failure does not stop later actions: waiters are always
    /// released. The first storage error is returned.
    fn execute(&self, inner: &mut Inner, actions: Vec<SessionAction>) -> Result<(), StorageError> {
        let mut first_error = None;

        for action in actions {
            match action {
                SessionAction::PersistFingerprint { hash, checked_at } => {
                    if let Err(e) = self.store.save(&hash, checked_at) {
                        tracing::error!(error = %e, "failed to persist fingerprint");
                        first_error.get_or_insert(e);
                    }
                },
                SessionAction::ClearPersisted => {
                    if let Err(e) = self.store.clear() {
                        tracing::error!(error = %e, "failed to clear persisted session");
                        first_error.get_or_insert(e);
                    }
                },
                SessionAction::ReleaseWaiters { waiters, outcome } => {
                    tracing::debug!(count = waiters.len(), ?outcome, "releasing waiters");
                    for id in waiters {
                        if let Some(tx) = inner.waiters.remove(&id) {
                            // Receiver gone means the caller stopped waiting
                            let _ = tx.send(outcome.clone());
                        }
                    }
                },
                SessionAction::PublishPassword(hash) => {
                    self.password_tx.send_replace(hash);
                },
                SessionAction::PublishPrompt(raised) => {
                    self.prompt_tx.send_replace(raised);
                },
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl<S, C, E> Drop for SessionManager<S, C, E>
where
    S: KeyValueStore,
    C: SecretCipher,
    E: Environment,
{
    fn drop(&mut self) {
        if let Some(task) = lock(&self.remote_task).take() {
            task.abort();
        }
    }
}

/// Removes an abandoned waiter from the session and the arena.
struct AbandonGuard<'a, S, C, E>
where
    S: KeyValueStore,
    C: SecretCipher,
    E: Environment,
{
    manager: &'a SessionManager<S, C, E>,
    id: WaiterId,
}

impl<S, C, E> Drop for AbandonGuard<'_, S, C, E>
where
    S: KeyValueStore,
    C: SecretCipher,
    E: Environment,
{
    fn drop(&mut self) {
        self.manager.abandon_wait(self.id);
    }
}

/// Every transition leaves the guarded state consistent, so a poisoned lock
/// is safe to reuse.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
