//! Settlement reconciliation.
//!
//! Normalized provider outcomes (webhook or requery) drive pending ledger
//! entries to a terminal state. The decision logic here is pure; the
//! repository layer applies the resulting action transactionally with a
//! status guard so every transition happens exactly once.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::SettlementError;
pub use service::{SettlementAction, SettlementService};
pub use types::{SettlementEvent, SettlementStatus};
