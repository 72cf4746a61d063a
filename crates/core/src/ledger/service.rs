//! Reservation and settlement arithmetic.
//!
//! This service contains pure business logic with no database dependencies.
//! The repository layer executes the plans it produces inside a single
//! storage transaction, using conditional (compare-and-swap) updates.

use velora_shared::types::Currency;

use super::error::LedgerError;
use super::types::EntryStatus;

/// The balance movements of a fund reservation.
///
/// `balance_after = balance_before - (amount + fee)`, and the same for the
/// ledger balance. The plan is only valid when the balance can cover the
/// total; the conditional update that applies it re-checks at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPlan {
    /// Amount plus fee, in minor units.
    pub total: i64,
    /// Spendable balance before the reservation.
    pub balance_before: i64,
    /// Spendable balance after the reservation.
    pub balance_after: i64,
    /// Ledger balance before the reservation.
    pub ledger_balance_before: i64,
    /// Ledger balance after the reservation.
    pub ledger_balance_after: i64,
}

/// The balance movements of a credit (funding, credit-back, reversal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPlan {
    /// Credited amount in minor units.
    pub total: i64,
    /// Spendable balance before the credit.
    pub balance_before: i64,
    /// Spendable balance after the credit.
    pub balance_after: i64,
    /// Ledger balance before the credit.
    pub ledger_balance_before: i64,
    /// Ledger balance after the credit.
    pub ledger_balance_after: i64,
}

/// Stateless service for ledger arithmetic and transition checks.
pub struct LedgerService;

impl LedgerService {
    /// Validates amounts and computes the balance movement of a reservation.
    ///
    /// # Errors
    ///
    /// - `ZeroAmount` / `NegativeAmount` / `NegativeFee` on invalid inputs
    /// - `AmountOverflow` when `amount + fee` exceeds the minor-unit range
    /// - `InsufficientFunds` when the balance cannot cover the total
    pub fn plan_reservation(
        balance: i64,
        ledger_balance: i64,
        amount: i64,
        fee: i64,
    ) -> Result<ReservationPlan, LedgerError> {
        let total = Self::validate_total(amount, fee)?;

        if balance < total {
            return Err(LedgerError::InsufficientFunds {
                available: balance,
                requested: total,
            });
        }

        Ok(ReservationPlan {
            total,
            balance_before: balance,
            balance_after: balance - total,
            ledger_balance_before: ledger_balance,
            ledger_balance_after: ledger_balance - total,
        })
    }

    /// Computes the balance movement of a credit.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount`/`NegativeAmount` on invalid input and
    /// `AmountOverflow` when the credit would overflow the balance.
    pub fn plan_credit(
        balance: i64,
        ledger_balance: i64,
        amount: i64,
    ) -> Result<CreditPlan, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if amount < 0 {
            return Err(LedgerError::NegativeAmount);
        }

        let balance_after = balance
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let ledger_balance_after = ledger_balance
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok(CreditPlan {
            total: amount,
            balance_before: balance,
            balance_after,
            ledger_balance_before: ledger_balance,
            ledger_balance_after,
        })
    }

    /// Validates amount/fee and returns the total balance impact.
    pub fn validate_total(amount: i64, fee: i64) -> Result<i64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if amount < 0 {
            return Err(LedgerError::NegativeAmount);
        }
        if fee < 0 {
            return Err(LedgerError::NegativeFee);
        }
        amount.checked_add(fee).ok_or(LedgerError::AmountOverflow)
    }

    /// Validates that an entry currency matches its wallet currency.
    pub fn validate_currency(wallet: Currency, requested: Currency) -> Result<(), LedgerError> {
        if wallet == requested {
            Ok(())
        } else {
            Err(LedgerError::CurrencyMismatch {
                wallet: wallet.to_string(),
                requested: requested.to_string(),
            })
        }
    }

    /// Validates a settlement transition out of `from` into `to`.
    ///
    /// Only `Pending → Successful` and `Pending → Failed` are allowed.
    /// A terminal entry yields `AlreadySettled` so callers can treat the
    /// duplicate delivery as a no-op rather than a hard failure.
    pub fn validate_settlement_transition(
        from: EntryStatus,
        to: EntryStatus,
    ) -> Result<(), LedgerError> {
        match (from, to) {
            (EntryStatus::Pending, EntryStatus::Successful | EntryStatus::Failed) => Ok(()),
            (EntryStatus::Successful | EntryStatus::Failed, _) => {
                Err(LedgerError::AlreadySettled { status: from })
            }
            (EntryStatus::Pending, EntryStatus::Pending) => Err(LedgerError::InvalidTransition {
                from,
                to,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_reservation() {
        let plan = LedgerService::plan_reservation(100_000, 100_000, 50_000, 2_500).unwrap();
        assert_eq!(plan.total, 52_500);
        assert_eq!(plan.balance_before, 100_000);
        assert_eq!(plan.balance_after, 47_500);
        assert_eq!(plan.ledger_balance_after, 47_500);
    }

    #[test]
    fn test_plan_reservation_insufficient_funds() {
        let result = LedgerService::plan_reservation(50_000, 50_000, 50_000, 2_500);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                available: 50_000,
                requested: 52_500,
            })
        ));
    }

    #[test]
    fn test_plan_reservation_exact_balance() {
        let plan = LedgerService::plan_reservation(52_500, 52_500, 50_000, 2_500).unwrap();
        assert_eq!(plan.balance_after, 0);
    }

    #[test]
    fn test_plan_reservation_zero_amount() {
        assert!(matches!(
            LedgerService::plan_reservation(100, 100, 0, 0),
            Err(LedgerError::ZeroAmount)
        ));
    }

    #[test]
    fn test_plan_reservation_negative_amount() {
        assert!(matches!(
            LedgerService::plan_reservation(100, 100, -5, 0),
            Err(LedgerError::NegativeAmount)
        ));
    }

    #[test]
    fn test_plan_reservation_negative_fee() {
        assert!(matches!(
            LedgerService::plan_reservation(100, 100, 5, -1),
            Err(LedgerError::NegativeFee)
        ));
    }

    #[test]
    fn test_plan_reservation_overflow() {
        assert!(matches!(
            LedgerService::plan_reservation(i64::MAX, i64::MAX, i64::MAX, 1),
            Err(LedgerError::AmountOverflow)
        ));
    }

    #[test]
    fn test_plan_credit() {
        let plan = LedgerService::plan_credit(47_500, 47_500, 52_500).unwrap();
        assert_eq!(plan.balance_after, 100_000);
        assert_eq!(plan.ledger_balance_after, 100_000);
    }

    #[test]
    fn test_plan_credit_overflow() {
        assert!(matches!(
            LedgerService::plan_credit(i64::MAX, 0, 1),
            Err(LedgerError::AmountOverflow)
        ));
    }

    #[test]
    fn test_validate_currency() {
        use velora_shared::types::Currency;
        assert!(LedgerService::validate_currency(Currency::Ngn, Currency::Ngn).is_ok());
        assert!(matches!(
            LedgerService::validate_currency(Currency::Ngn, Currency::Usd),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_settlement_transition_from_pending() {
        assert!(
            LedgerService::validate_settlement_transition(
                EntryStatus::Pending,
                EntryStatus::Successful
            )
            .is_ok()
        );
        assert!(
            LedgerService::validate_settlement_transition(
                EntryStatus::Pending,
                EntryStatus::Failed
            )
            .is_ok()
        );
    }

    #[test]
    fn test_settlement_transition_from_terminal_is_already_settled() {
        assert!(matches!(
            LedgerService::validate_settlement_transition(
                EntryStatus::Successful,
                EntryStatus::Failed
            ),
            Err(LedgerError::AlreadySettled {
                status: EntryStatus::Successful
            })
        ));
        assert!(matches!(
            LedgerService::validate_settlement_transition(
                EntryStatus::Failed,
                EntryStatus::Successful
            ),
            Err(LedgerError::AlreadySettled {
                status: EntryStatus::Failed
            })
        ));
    }

    #[test]
    fn test_settlement_transition_pending_to_pending_invalid() {
        assert!(matches!(
            LedgerService::validate_settlement_transition(
                EntryStatus::Pending,
                EntryStatus::Pending
            ),
            Err(LedgerError::InvalidTransition { .. })
        ));
    }
}
