//! Core business logic for Velora.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state machines live here.
//!
//! # Modules
//!
//! - `ledger` - Wallet balances, ledger entries, reservation math
//! - `budget` - Budget lifecycle and allocation rules
//! - `policy` - Transfer policy evaluation (calendar, spend limit, invoice)
//! - `approval` - Approval rules, reviewer quorum, deferred actions
//! - `settlement` - Settlement reconciliation state machine
//! - `counterparty` - Bank account resolution types
//! - `provider` - External provider contracts
//! - `notify` - Fire-and-forget notification collaborator

pub mod approval;
pub mod budget;
pub mod counterparty;
pub mod ledger;
pub mod notify;
pub mod policy;
pub mod provider;
pub mod settlement;
