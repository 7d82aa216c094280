//! Operations for model-based testing.
//!
//! Operations represent everything a user, a caller or the platform can do to
//! a session. They are generated randomly by proptest and applied to both the
//! model and the real implementation.

use arbitrary::{Arbitrary, Unstructured};
use passgate_crypto::{PasswordHash, hash_password};

/// Number of distinct passwords the model draws from.
pub const PASSWORD_POOL: u8 = 3;

/// One of a small pool of passwords.
///
/// A small pool keeps mismatches and re-entries of the right password
/// equally likely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelPassword(u8);

impl ModelPassword {
    /// Password number `index` of the pool (wraps).
    pub fn new(index: u8) -> Self {
        Self(index % PASSWORD_POOL)
    }

    /// Raw password text.
    pub fn raw(self) -> String {
        format!("model-password-{}", self.0)
    }

    /// Fingerprint of the raw password.
    pub fn hash(self) -> PasswordHash {
        hash_password(&self.raw())
    }

    /// Which pool password a fingerprint belongs to.
    pub fn from_hash(hash: &PasswordHash) -> Option<Self> {
        (0..PASSWORD_POOL).map(Self::new).find(|p| &p.hash() == hash)
    }
}

impl<'a> Arbitrary<'a> for ModelPassword {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::new(u.arbitrary()?))
    }
}

/// Operations that can be applied to a session.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// The user submits a password.
    SetPassword {
        /// Submitted password.
        password: ModelPassword,
    },

    /// The user logs out.
    ClearPassword,

    /// The user dismisses the prompt.
    CancelPrompt,

    /// A caller starts waiting for the password.
    StartWait,

    /// A caller decrypts something the current password cannot open.
    ///
    /// Only applied while verified; an unverified decrypt would just wait.
    FailDecrypt,

    /// Wall-clock time passes.
    AdvanceClock {
        /// Hours to advance.
        hours: u8,
    },

    /// The process restarts: pending waits shut down, a new session
    /// bootstraps from storage.
    Restart,
}
