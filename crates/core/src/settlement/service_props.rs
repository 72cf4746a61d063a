//! Property-based tests for the settlement decision rules.

use proptest::prelude::*;

use crate::ledger::types::EntryStatus;
use crate::settlement::service::{SettlementAction, SettlementService};
use crate::settlement::types::SettlementStatus;

fn arb_entry_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Pending),
        Just(EntryStatus::Successful),
        Just(EntryStatus::Failed),
    ]
}

fn arb_event_status() -> impl Strategy<Value = SettlementStatus> {
    prop_oneof![
        Just(SettlementStatus::Successful),
        Just(SettlementStatus::Failed),
        Just(SettlementStatus::Reversed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A terminal entry only ever produces Compensate (reversal of a
    /// success) or a no-op — it is never marked or credited back again.
    #[test]
    fn prop_terminal_entries_never_resettle(
        entry_status in arb_entry_status(),
        reversed in any::<bool>(),
        event_status in arb_event_status(),
        total in 1i64..1_000_000_000,
    ) {
        let action = SettlementService::decide(entry_status, reversed, event_status, total);
        if entry_status.is_terminal() {
            prop_assert!(!matches!(
                action,
                SettlementAction::MarkSuccessful | SettlementAction::CreditBack { .. }
            ), "terminal entries never re-settle");
        }
    }

    /// Replaying the event against the post-action state is a no-op, so a
    /// duplicate delivery leaves the final state unchanged.
    #[test]
    fn prop_replay_is_noop(
        event_status in arb_event_status(),
        total in 1i64..1_000_000_000,
    ) {
        let first = SettlementService::decide(EntryStatus::Pending, false, event_status, total);

        // Apply the first action to derive the entry's next state.
        let (next_status, next_reversed) = match first {
            SettlementAction::MarkSuccessful => (EntryStatus::Successful, false),
            SettlementAction::CreditBack { .. } => (EntryStatus::Failed, false),
            SettlementAction::Compensate { .. } => (EntryStatus::Successful, true),
            SettlementAction::AlreadySettled => (EntryStatus::Pending, false),
        };

        let replay = SettlementService::decide(next_status, next_reversed, event_status, total);
        prop_assert_eq!(replay, SettlementAction::AlreadySettled);
    }

    /// Money-moving actions always carry the entry total.
    #[test]
    fn prop_credit_amounts_match_total(
        entry_status in arb_entry_status(),
        reversed in any::<bool>(),
        event_status in arb_event_status(),
        total in 1i64..1_000_000_000,
    ) {
        match SettlementService::decide(entry_status, reversed, event_status, total) {
            SettlementAction::CreditBack { amount } | SettlementAction::Compensate { amount } => {
                prop_assert_eq!(amount, total);
            }
            SettlementAction::MarkSuccessful | SettlementAction::AlreadySettled => {}
        }
    }

    /// A second reversal after the marker is stamped is always a no-op —
    /// exactly one compensating credit can ever be produced.
    #[test]
    fn prop_reversal_idempotent(
        entry_status in arb_entry_status(),
        total in 1i64..1_000_000_000,
    ) {
        let action =
            SettlementService::decide(entry_status, true, SettlementStatus::Reversed, total);
        prop_assert_eq!(action, SettlementAction::AlreadySettled);
    }
}
