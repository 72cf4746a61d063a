//! Transfer policy evaluation.
//!
//! Policies gate debits before any reservation happens:
//! - `Calendar` blocks transfers on configured weekdays
//! - `SpendLimit` blocks when a rolling-window spend sum would be exceeded
//! - `Invoice` requires an attached invoice for matching transfers

pub mod engine;
pub mod error;
pub mod types;

pub use engine::PolicyEngine;
pub use error::{PolicyError, PolicyViolation};
pub use types::{
    PolicyDecision, PolicyKind, PolicyScope, PolicyWindow, SpendQuery, TransferContext,
    TransferPolicy,
};
