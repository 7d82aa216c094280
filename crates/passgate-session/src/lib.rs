//! Passgate password session
//!
//! Password-gated secret encryption. No secret is sealed or opened without a
//! password verified against the locally stored fingerprint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  set / clear / cancel   ┌────────────────────┐
//! │  prompt UI   │ ──────────────────────▶ │  SessionManager    │
//! │              │ ◀── asking_for_password │                    │
//! └──────────────┘                         │  PasswordSession   │──▶ SessionStore
//!                                          │  (pure, actions)   │
//! ┌──────────────┐  encrypt / decrypt      │  waiter arena      │
//! │   callers    │ ──────────────────────▶ │                    │──▶ SecretCipher
//! └──────────────┘ ◀── wait_for_password   └────────────────────┘
//!                                                    ▲
//!                          RemoteEvent::Disconnected │
//! ```
//!
//! - [`PasswordSession`]: in-memory state machine producing [`SessionAction`]s
//! - [`SessionManager`]: executes actions, owns waiters and observables
//! - [`SecretCipher`] / [`ArmoredCipher`]: the encryption seam
//!
//! # Trust Policy
//!
//! A successful password entry is trusted across restarts for the configured
//! freshness window (24 hours by default). Failed re-entry keeps the current
//! session; a failed decryption drops the in-memory password so the user is
//! asked again.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cipher;
mod error;
mod manager;
mod remote;
mod state;

pub use cipher::{ArmoredCipher, SecretCipher};
pub use error::{CipherError, SessionError};
pub use manager::SessionManager;
pub use passgate_core::SessionConfig;
pub use remote::RemoteEvent;
pub use state::{
    BootstrapDecision, PasswordSession, SessionAction, Verification, WaitOutcome, WaitStart,
    WaiterId,
};
