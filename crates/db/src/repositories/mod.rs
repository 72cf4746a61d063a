//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every multi-row mutation runs in a single transaction, and balances are
//! only ever touched through conditional (compare-and-swap) updates.

pub mod approval;
pub mod budget;
pub mod counterparty;
pub mod policy;
pub mod settlement;
pub mod wallet;

#[cfg(test)]
mod mapping_tests;

pub use approval::{ApprovalRepository, CreateRuleInput, RequestOrExecute, ReviewOutcome};
pub use budget::{BudgetRepository, CreateBudgetInput};
pub use counterparty::CounterpartyResolver;
pub use policy::PolicyRepository;
pub use settlement::{SettlementOutcome, SettlementRepository};
pub use wallet::{EntryFilter, ReserveFundsInput, WalletRepository};
