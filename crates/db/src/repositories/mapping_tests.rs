//! Database-free tests for enum mappers and reconciliation scenarios.
//!
//! These exercise the mapping layer between database rows and core domain
//! types, plus the end-to-end decision sequences the repositories apply
//! transactionally.

use chrono::Weekday;

use velora_core::approval::{ApprovalType, RequestStatus};
use velora_core::budget::BudgetStatus;
use velora_core::ledger::{EntryStatus, LedgerService};
use velora_core::settlement::{SettlementAction, SettlementService, SettlementStatus};

use crate::entities::sea_orm_active_enums as db_enums;

use super::approval::{to_core_approval_type, to_core_request_status};
use super::budget::to_core_budget_status;
use super::policy::{parse_weekdays, weekdays_to_json};
use super::settlement::to_core_entry_status;

#[test]
fn test_entry_status_mapping() {
    assert_eq!(
        to_core_entry_status(&db_enums::EntryStatus::Pending),
        EntryStatus::Pending
    );
    assert_eq!(
        to_core_entry_status(&db_enums::EntryStatus::Successful),
        EntryStatus::Successful
    );
    assert_eq!(
        to_core_entry_status(&db_enums::EntryStatus::Failed),
        EntryStatus::Failed
    );
}

#[test]
fn test_budget_status_mapping() {
    assert_eq!(
        to_core_budget_status(&db_enums::BudgetStatus::Pending),
        BudgetStatus::Pending
    );
    assert_eq!(
        to_core_budget_status(&db_enums::BudgetStatus::Active),
        BudgetStatus::Active
    );
    assert_eq!(
        to_core_budget_status(&db_enums::BudgetStatus::Paused),
        BudgetStatus::Paused
    );
    assert_eq!(
        to_core_budget_status(&db_enums::BudgetStatus::Closed),
        BudgetStatus::Closed
    );
}

#[test]
fn test_approval_enum_mapping() {
    assert_eq!(
        to_core_approval_type(&db_enums::ApprovalType::Everyone),
        ApprovalType::Everyone
    );
    assert_eq!(
        to_core_approval_type(&db_enums::ApprovalType::Anyone),
        ApprovalType::Anyone
    );
    assert_eq!(
        to_core_request_status(&db_enums::RequestStatus::Declined),
        RequestStatus::Declined
    );
}

#[test]
fn test_weekday_json_round_trip() {
    let days = vec![Weekday::Mon, Weekday::Sat, Weekday::Sun];
    let json = weekdays_to_json(&days);
    assert_eq!(parse_weekdays(&json), Some(days));
}

#[test]
fn test_weekday_json_rejects_out_of_range() {
    let json = serde_json::json!([1, 8]);
    assert_eq!(parse_weekdays(&json), None);
}

mod weekday_props {
    use super::*;
    use proptest::prelude::*;

    const ALL_DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    proptest! {
        /// Any subset of weekdays survives the JSON column round trip.
        #[test]
        fn prop_weekday_subset_round_trips(mask in 0u8..128) {
            let days: Vec<Weekday> = ALL_DAYS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, d)| *d)
                .collect();

            let json = weekdays_to_json(&days);
            prop_assert_eq!(parse_weekdays(&json), Some(days));
        }
    }
}

// ============================================================================
// Scenario walk-throughs: the decision sequences the repositories apply.
// ============================================================================

/// Wallet 100_000; transfer 50_000 + fee 2_500: reserved to 47_500, then a
/// successful settlement leaves the balance alone.
#[test]
fn test_scenario_reserve_then_successful_settlement() {
    let plan = LedgerService::plan_reservation(100_000, 100_000, 50_000, 2_500).unwrap();
    assert_eq!(plan.balance_after, 47_500);

    let action = SettlementService::decide(
        EntryStatus::Pending,
        false,
        SettlementStatus::Successful,
        plan.total,
    );
    assert_eq!(action, SettlementAction::MarkSuccessful);
    // No credit back: balance stays at 47_500.
}

/// Same setup, provider replies failed: 52_500 comes back and the balance
/// returns to 100_000.
#[test]
fn test_scenario_reserve_then_failed_settlement() {
    let plan = LedgerService::plan_reservation(100_000, 100_000, 50_000, 2_500).unwrap();

    let action = SettlementService::decide(
        EntryStatus::Pending,
        false,
        SettlementStatus::Failed,
        plan.total,
    );
    assert_eq!(action, SettlementAction::CreditBack { amount: 52_500 });

    let credit =
        LedgerService::plan_credit(plan.balance_after, plan.ledger_balance_after, 52_500).unwrap();
    assert_eq!(credit.balance_after, 100_000);
}

/// Replaying the failed settlement after the credit back is a no-op: the
/// compensation happens exactly once.
#[test]
fn test_scenario_failed_settlement_replay_is_noop() {
    let action = SettlementService::decide(
        EntryStatus::Failed,
        false,
        SettlementStatus::Failed,
        52_500,
    );
    assert_eq!(action, SettlementAction::AlreadySettled);
}

/// A reversal after success produces exactly one compensating credit, even
/// when delivered twice.
#[test]
fn test_scenario_reversal_exactly_once() {
    let first = SettlementService::decide(
        EntryStatus::Successful,
        false,
        SettlementStatus::Reversed,
        52_500,
    );
    assert_eq!(first, SettlementAction::Compensate { amount: 52_500 });

    // After the reversal marker is stamped, the duplicate is a no-op.
    let second = SettlementService::decide(
        EntryStatus::Successful,
        true,
        SettlementStatus::Reversed,
        52_500,
    );
    assert_eq!(second, SettlementAction::AlreadySettled);
}
