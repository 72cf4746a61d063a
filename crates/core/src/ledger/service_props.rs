//! Property-based tests for reservation and credit arithmetic.

use proptest::prelude::*;

use crate::ledger::error::LedgerError;
use crate::ledger::service::LedgerService;
use crate::ledger::types::EntryStatus;

/// Strategy for generating non-negative balances.
fn balance_strategy() -> impl Strategy<Value = i64> {
    0i64..10_000_000_000
}

/// Strategy for generating positive amounts.
fn amount_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000
}

/// Strategy for generating non-negative fees.
fn fee_strategy() -> impl Strategy<Value = i64> {
    0i64..10_000_000
}

fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Pending),
        Just(EntryStatus::Successful),
        Just(EntryStatus::Failed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A reservation always moves the balance by exactly amount + fee.
    #[test]
    fn prop_reservation_moves_exact_total(
        balance in balance_strategy(),
        amount in amount_strategy(),
        fee in fee_strategy(),
    ) {
        match LedgerService::plan_reservation(balance, balance, amount, fee) {
            Ok(plan) => {
                prop_assert_eq!(plan.total, amount + fee);
                prop_assert_eq!(plan.balance_before - plan.balance_after, plan.total);
                prop_assert_eq!(
                    plan.ledger_balance_before - plan.ledger_balance_after,
                    plan.total
                );
            }
            Err(LedgerError::InsufficientFunds { available, requested }) => {
                prop_assert_eq!(available, balance);
                prop_assert_eq!(requested, amount + fee);
                prop_assert!(balance < amount + fee);
            }
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// A successful reservation never drives the balance negative.
    #[test]
    fn prop_reservation_never_negative(
        balance in balance_strategy(),
        amount in amount_strategy(),
        fee in fee_strategy(),
    ) {
        if let Ok(plan) = LedgerService::plan_reservation(balance, balance, amount, fee) {
            prop_assert!(plan.balance_after >= 0);
        }
    }

    /// Reserving then crediting back the same total restores the balance.
    #[test]
    fn prop_reserve_then_credit_back_is_identity(
        balance in balance_strategy(),
        amount in amount_strategy(),
        fee in fee_strategy(),
    ) {
        if let Ok(plan) = LedgerService::plan_reservation(balance, balance, amount, fee) {
            let credit = LedgerService::plan_credit(
                plan.balance_after,
                plan.ledger_balance_after,
                plan.total,
            )
            .expect("credit back of a valid reservation total must plan");
            prop_assert_eq!(credit.balance_after, balance);
            prop_assert_eq!(credit.ledger_balance_after, balance);
        }
    }

    /// A sequence of reservations debits exactly the sum of the accepted totals.
    #[test]
    fn prop_sequential_reservations_sum(
        initial in balance_strategy(),
        requests in prop::collection::vec((amount_strategy(), fee_strategy()), 1..20),
    ) {
        let mut balance = initial;
        let mut debited: i64 = 0;

        for (amount, fee) in requests {
            if let Ok(plan) = LedgerService::plan_reservation(balance, balance, amount, fee) {
                balance = plan.balance_after;
                debited += plan.total;
            }
        }

        prop_assert_eq!(balance, initial - debited);
        prop_assert!(balance >= 0);
    }

    /// A terminal entry never accepts another settlement transition.
    #[test]
    fn prop_terminal_entries_reject_transitions(
        from in arb_status(),
        to in arb_status(),
    ) {
        let result = LedgerService::validate_settlement_transition(from, to);
        if from.is_terminal() {
            prop_assert!(matches!(result, Err(LedgerError::AlreadySettled { .. })), "expected AlreadySettled");
        } else if to.is_terminal() {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(LedgerError::InvalidTransition { .. })), "expected InvalidTransition");
        }
    }
}
