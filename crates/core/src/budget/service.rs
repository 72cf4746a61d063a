//! Budget lifecycle validation and planning.
//!
//! Stateless logic: the repository layer executes the resulting plans in the
//! same storage transaction as the wallet movement and ledger entry.

use velora_shared::types::UserId;

use super::error::BudgetError;
use super::types::{Budget, BudgetStatus};

/// Planned outcome of closing a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosurePlan {
    /// Remainder returned to the wallet or parent project.
    pub remainder: i64,
}

/// Planned outcome of extending a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionPlan {
    /// New approved ceiling.
    pub amount: i64,
    /// New spendable remainder.
    pub balance: i64,
}

/// Stateless service for budget rules.
pub struct BudgetService;

impl BudgetService {
    /// Validates that a pending budget can be funded and activated.
    ///
    /// Activation sets `balance = amount`; the wallet debit for `amount` is
    /// reserved by the ledger in the same transaction.
    pub fn validate_funding(budget: &Budget) -> Result<(), BudgetError> {
        match budget.status {
            BudgetStatus::Pending => Ok(()),
            from => Err(BudgetError::InvalidTransition {
                from,
                to: BudgetStatus::Active,
            }),
        }
    }

    /// Validates a spend from the budget by a beneficiary.
    ///
    /// `spent_by_user` is the beneficiary's prior successful+pending spend
    /// inside this budget, injected by the caller so this stays pure.
    pub fn validate_spend(
        budget: &Budget,
        user_id: UserId,
        spent_by_user: i64,
        total: i64,
    ) -> Result<(), BudgetError> {
        if budget.status != BudgetStatus::Active {
            return Err(BudgetError::NotActive(budget.status));
        }

        let beneficiary = budget
            .beneficiary(user_id)
            .ok_or(BudgetError::NotABeneficiary(user_id.into_inner()))?;

        if let Some(allocation) = beneficiary.allocation {
            let would_spend = spent_by_user
                .checked_add(total)
                .ok_or(BudgetError::AmountOverflow)?;
            if would_spend > allocation {
                return Err(BudgetError::AllocationExceeded {
                    user_id: user_id.into_inner(),
                    allocation,
                    spent: spent_by_user,
                    requested: total,
                });
            }
        }

        if budget.balance < total {
            return Err(BudgetError::InsufficientBalance {
                available: budget.balance,
                requested: total,
            });
        }

        Ok(())
    }

    /// Plans closing a budget: remainder goes back, balance drops to zero.
    ///
    /// Closing is allowed from any non-terminal status.
    pub fn plan_closure(budget: &Budget) -> Result<ClosurePlan, BudgetError> {
        if budget.status.is_terminal() {
            return Err(BudgetError::InvalidTransition {
                from: budget.status,
                to: BudgetStatus::Closed,
            });
        }

        Ok(ClosurePlan {
            remainder: budget.balance,
        })
    }

    /// Plans extending an active budget by `additional` minor units.
    pub fn plan_extension(budget: &Budget, additional: i64) -> Result<ExtensionPlan, BudgetError> {
        if additional <= 0 {
            return Err(BudgetError::InvalidExtensionAmount);
        }
        if budget.status != BudgetStatus::Active {
            return Err(BudgetError::NotActive(budget.status));
        }

        let amount = budget
            .amount
            .checked_add(additional)
            .ok_or(BudgetError::AmountOverflow)?;
        let balance = budget
            .balance
            .checked_add(additional)
            .ok_or(BudgetError::AmountOverflow)?;

        Ok(ExtensionPlan { amount, balance })
    }

    /// Validates a pause transition.
    pub fn validate_pause(status: BudgetStatus) -> Result<(), BudgetError> {
        match status {
            BudgetStatus::Active => Ok(()),
            from => Err(BudgetError::InvalidTransition {
                from,
                to: BudgetStatus::Paused,
            }),
        }
    }

    /// Validates an unpause transition.
    pub fn validate_unpause(status: BudgetStatus) -> Result<(), BudgetError> {
        match status {
            BudgetStatus::Paused => Ok(()),
            from => Err(BudgetError::InvalidTransition {
                from,
                to: BudgetStatus::Active,
            }),
        }
    }

    /// Returns true when a spend leaves the balance at or below the
    /// low-balance threshold, for notification purposes.
    #[must_use]
    pub fn crosses_threshold(budget: &Budget, balance_after: i64) -> bool {
        budget
            .threshold
            .is_some_and(|t| budget.balance > t && balance_after <= t)
    }
}
