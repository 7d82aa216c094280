//! Deterministic simulation harness for passgate session testing.
//!
//! Seeded implementations of the Environment and storage traits for
//! deterministic, reproducible tests of the password session.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the session
//! semantics. Operations are applied to both the model and the real
//! `SessionManager`, and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chaotic_store;
pub mod model;
pub mod sim_env;

pub use chaotic_store::ChaoticStore;
pub use model::{
    ModelOutcome, ModelPassword, ObservableState, Operation, OperationResult, SessionModel,
};
pub use sim_env::SimEnv;
