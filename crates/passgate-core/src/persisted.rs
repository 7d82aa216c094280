//! Persisted session fields.
//!
//! Two keys survive restarts: the fingerprint of the last verified password
//! and the wall-clock time it was last verified. Both are written together
//! on every successful verification and removed together on logout.

use passgate_crypto::PasswordHash;

use crate::{KeyValueStore, StorageError, Timestamp};

/// Storage key holding the persisted fingerprint (64 lowercase hex chars).
pub const PASSWORD_KEY: &str = "password";

/// Storage key holding the last verification time (decimal epoch millis).
pub const LAST_CHECKED_KEY: &str = "last-checked";

/// Snapshot of what storage holds for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    /// Fingerprint of the last successfully verified password.
    pub stored_hash: Option<PasswordHash>,
    /// When that password was last verified.
    pub last_checked_at: Option<Timestamp>,
}

impl PersistedSession {
    /// Whether the last verification happened within `window` of `now`.
    ///
    /// Missing timestamps are stale. Timestamps in the future (clock moved
    /// backwards) count as fresh.
    pub fn is_fresh(&self, now: Timestamp, window: std::time::Duration) -> bool {
        match self.last_checked_at {
            Some(checked_at) => checked_at.saturating_add(window) >= now,
            None => false,
        }
    }
}

/// Typed access to the persisted session fields.
///
/// Wraps any [`KeyValueStore`]; clones share the underlying store.
#[derive(Clone)]
pub struct SessionStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wrap a key/value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying key/value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Read both persisted fields.
    ///
    /// # Errors
    ///
    /// - `Io` if the store fails
    /// - `Corrupted` if the stored fingerprint is not 64 hex characters
    ///
    /// An unparsable timestamp is not an error: it reads as absent, so the
    /// session is not trusted on bootstrap and the next password is checked
    /// against the stored fingerprint.
    pub fn load(&self) -> Result<PersistedSession, StorageError> {
        let stored_hash = match self.store.get(PASSWORD_KEY)? {
            Some(hex) => Some(PasswordHash::from_hex(&hex).map_err(|e| {
                StorageError::Corrupted { key: PASSWORD_KEY.to_owned(), reason: e.to_string() }
            })?),
            None => None,
        };

        let last_checked_at = match self.store.get(LAST_CHECKED_KEY)? {
            Some(raw) => {
                let parsed = Timestamp::parse(&raw);
                if parsed.is_none() {
                    tracing::warn!(value = %raw, "ignoring unparsable last-checked timestamp");
                }
                parsed
            },
            None => None,
        };

        Ok(PersistedSession { stored_hash, last_checked_at })
    }

    /// Persist a verified fingerprint and its verification time.
    ///
    /// The fingerprint is written first so a failure between the two writes
    /// leaves a stale (not falsely fresh) session.
    pub fn save(&self, hash: &PasswordHash, checked_at: Timestamp) -> Result<(), StorageError> {
        self.store.set(PASSWORD_KEY, hash.as_str())?;
        self.store.set(LAST_CHECKED_KEY, &checked_at.to_string())?;
        tracing::debug!(checked_at = %checked_at, "persisted password fingerprint");
        Ok(())
    }

    /// Remove both persisted fields.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(PASSWORD_KEY)?;
        self.store.remove(LAST_CHECKED_KEY)?;
        tracing::debug!("cleared persisted session");
        Ok(())
    }
}
