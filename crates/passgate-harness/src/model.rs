//! Reference model of the password session.
//!
//! A deliberately naive implementation: plain fields, no channels, no
//! actions. It is the oracle the real `SessionManager` is compared against.

mod operation;
mod session;

pub use operation::{ModelPassword, Operation, PASSWORD_POOL};
pub use session::{ModelOutcome, ObservableState, OperationResult, SessionModel};
