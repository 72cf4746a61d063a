//! Wallet ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Wallet and ledger entry domain types
//! - The entry status state machine (pending to terminal, exactly once)
//! - Reservation and credit-back arithmetic
//! - Error types for ledger operations

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::{CreditPlan, LedgerService, ReservationPlan};
pub use types::{EntryScope, EntryStatus, EntryType, Wallet, WalletEntry};
