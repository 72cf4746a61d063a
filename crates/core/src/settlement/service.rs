//! Settlement decision logic.
//!
//! Given the entry's current state and a reported outcome, decide the
//! action to apply. The decision is pure; the repository layer applies it
//! with a conditional update so replays and races collapse to no-ops.

use crate::ledger::types::EntryStatus;

use super::types::SettlementStatus;

/// The action a settlement event resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementAction {
    /// Mark the pending entry Successful and run the scope confirm hook.
    MarkSuccessful,
    /// Mark the pending entry Failed and credit `amount` back to its owner.
    CreditBack {
        /// Amount plus fee to return, in minor units.
        amount: i64,
    },
    /// Stamp the reversal marker on the successful entry and record a new
    /// compensating credit of `amount` referencing it.
    Compensate {
        /// Amount plus fee to return, in minor units.
        amount: i64,
    },
    /// The entry is already terminal (or already reversed); the event is a
    /// duplicate delivery and processing is a no-op success.
    AlreadySettled,
}

/// Stateless settlement reconciliation rules.
pub struct SettlementService;

impl SettlementService {
    /// Decides the action for a settlement event.
    ///
    /// State machine:
    /// - `Pending → Successful` on a successful outcome
    /// - `Pending → Failed` (+ credit back) on a failed outcome
    /// - `Successful → reversal stamp + compensating credit` on a reversal
    /// - a reversal of a still-Pending entry behaves like a failure
    /// - every other combination is a duplicate delivery: no-op
    ///
    /// `entry_total` is the entry's `amount + fee`; `already_reversed`
    /// reflects the reversal marker on the entry at read time.
    #[must_use]
    pub fn decide(
        entry_status: EntryStatus,
        already_reversed: bool,
        event_status: SettlementStatus,
        entry_total: i64,
    ) -> SettlementAction {
        match event_status {
            SettlementStatus::Successful => match entry_status {
                EntryStatus::Pending => SettlementAction::MarkSuccessful,
                EntryStatus::Successful | EntryStatus::Failed => SettlementAction::AlreadySettled,
            },
            SettlementStatus::Failed => match entry_status {
                EntryStatus::Pending => SettlementAction::CreditBack {
                    amount: entry_total,
                },
                EntryStatus::Successful | EntryStatus::Failed => SettlementAction::AlreadySettled,
            },
            SettlementStatus::Reversed => {
                if already_reversed {
                    return SettlementAction::AlreadySettled;
                }
                match entry_status {
                    // Funds were credited then clawed back: record a new
                    // compensating entry, never rewrite history.
                    EntryStatus::Successful => SettlementAction::Compensate {
                        amount: entry_total,
                    },
                    // Reversal of an unsettled transfer is a failure.
                    EntryStatus::Pending => SettlementAction::CreditBack {
                        amount: entry_total,
                    },
                    EntryStatus::Failed => SettlementAction::AlreadySettled,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_settles_pending_entry() {
        let action = SettlementService::decide(
            EntryStatus::Pending,
            false,
            SettlementStatus::Successful,
            52_500,
        );
        assert_eq!(action, SettlementAction::MarkSuccessful);
    }

    #[test]
    fn test_successful_on_terminal_entry_is_noop() {
        for status in [EntryStatus::Successful, EntryStatus::Failed] {
            let action =
                SettlementService::decide(status, false, SettlementStatus::Successful, 52_500);
            assert_eq!(action, SettlementAction::AlreadySettled);
        }
    }

    #[test]
    fn test_failed_credits_back_amount_plus_fee() {
        let action = SettlementService::decide(
            EntryStatus::Pending,
            false,
            SettlementStatus::Failed,
            52_500,
        );
        assert_eq!(action, SettlementAction::CreditBack { amount: 52_500 });
    }

    #[test]
    fn test_failed_on_terminal_entry_is_noop() {
        for status in [EntryStatus::Successful, EntryStatus::Failed] {
            let action =
                SettlementService::decide(status, false, SettlementStatus::Failed, 52_500);
            assert_eq!(action, SettlementAction::AlreadySettled);
        }
    }

    #[test]
    fn test_reversal_of_successful_entry_compensates() {
        let action = SettlementService::decide(
            EntryStatus::Successful,
            false,
            SettlementStatus::Reversed,
            52_500,
        );
        assert_eq!(action, SettlementAction::Compensate { amount: 52_500 });
    }

    #[test]
    fn test_reversal_of_pending_entry_behaves_like_failure() {
        let action = SettlementService::decide(
            EntryStatus::Pending,
            false,
            SettlementStatus::Reversed,
            52_500,
        );
        assert_eq!(action, SettlementAction::CreditBack { amount: 52_500 });
    }

    #[test]
    fn test_reversal_is_idempotent() {
        let action = SettlementService::decide(
            EntryStatus::Successful,
            true,
            SettlementStatus::Reversed,
            52_500,
        );
        assert_eq!(action, SettlementAction::AlreadySettled);
    }

    #[test]
    fn test_reversal_of_failed_entry_is_noop() {
        let action = SettlementService::decide(
            EntryStatus::Failed,
            false,
            SettlementStatus::Reversed,
            52_500,
        );
        assert_eq!(action, SettlementAction::AlreadySettled);
    }
}
