//! Tests for budget lifecycle rules.

use chrono::Utc;
use velora_shared::types::{
    BudgetId, Currency, OrganizationId, UserId, WalletId,
};

use super::error::BudgetError;
use super::service::BudgetService;
use super::types::{Beneficiary, Budget, BudgetStatus};

fn make_budget(status: BudgetStatus, amount: i64, balance: i64) -> Budget {
    Budget {
        id: BudgetId::new(),
        organization_id: OrganizationId::new(),
        wallet_id: WalletId::new(),
        project_id: None,
        name: "Marketing Q3".to_string(),
        amount,
        balance,
        amount_used: amount - balance,
        status,
        threshold: None,
        beneficiaries: vec![],
        currency: Currency::Ngn,
        created_by: UserId::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn with_beneficiary(mut budget: Budget, user_id: UserId, allocation: Option<i64>) -> Budget {
    budget.beneficiaries.push(Beneficiary { user_id, allocation });
    budget
}

mod funding {
    use super::*;

    #[test]
    fn test_pending_budget_can_fund() {
        let budget = make_budget(BudgetStatus::Pending, 200_000, 0);
        assert!(BudgetService::validate_funding(&budget).is_ok());
    }

    #[test]
    fn test_active_budget_cannot_refund() {
        let budget = make_budget(BudgetStatus::Active, 200_000, 200_000);
        assert!(matches!(
            BudgetService::validate_funding(&budget),
            Err(BudgetError::InvalidTransition {
                from: BudgetStatus::Active,
                to: BudgetStatus::Active,
            })
        ));
    }

    #[test]
    fn test_closed_budget_cannot_fund() {
        let budget = make_budget(BudgetStatus::Closed, 200_000, 0);
        assert!(matches!(
            BudgetService::validate_funding(&budget),
            Err(BudgetError::InvalidTransition { .. })
        ));
    }
}

mod spending {
    use super::*;

    #[test]
    fn test_beneficiary_can_spend_within_balance() {
        let user = UserId::new();
        let budget = with_beneficiary(
            make_budget(BudgetStatus::Active, 200_000, 150_000),
            user,
            None,
        );
        assert!(BudgetService::validate_spend(&budget, user, 0, 100_000).is_ok());
    }

    #[test]
    fn test_non_beneficiary_rejected() {
        let budget = with_beneficiary(
            make_budget(BudgetStatus::Active, 200_000, 150_000),
            UserId::new(),
            None,
        );
        let outsider = UserId::new();
        assert!(matches!(
            BudgetService::validate_spend(&budget, outsider, 0, 1_000),
            Err(BudgetError::NotABeneficiary(_))
        ));
    }

    #[test]
    fn test_paused_budget_rejects_spend() {
        let user = UserId::new();
        let budget = with_beneficiary(
            make_budget(BudgetStatus::Paused, 200_000, 150_000),
            user,
            None,
        );
        assert!(matches!(
            BudgetService::validate_spend(&budget, user, 0, 1_000),
            Err(BudgetError::NotActive(BudgetStatus::Paused))
        ));
    }

    #[test]
    fn test_spend_beyond_balance_rejected() {
        let user = UserId::new();
        let budget = with_beneficiary(
            make_budget(BudgetStatus::Active, 200_000, 50_000),
            user,
            None,
        );
        assert!(matches!(
            BudgetService::validate_spend(&budget, user, 0, 60_000),
            Err(BudgetError::InsufficientBalance {
                available: 50_000,
                requested: 60_000,
            })
        ));
    }

    #[test]
    fn test_allocation_cap_enforced() {
        let user = UserId::new();
        let budget = with_beneficiary(
            make_budget(BudgetStatus::Active, 200_000, 200_000),
            user,
            Some(30_000),
        );

        // Within cap: 20_000 spent, 10_000 more is exactly the cap.
        assert!(BudgetService::validate_spend(&budget, user, 20_000, 10_000).is_ok());

        // Beyond cap.
        assert!(matches!(
            BudgetService::validate_spend(&budget, user, 20_000, 10_001),
            Err(BudgetError::AllocationExceeded {
                allocation: 30_000,
                spent: 20_000,
                requested: 10_001,
                ..
            })
        ));
    }

    #[test]
    fn test_allocation_checked_before_balance() {
        let user = UserId::new();
        let budget = with_beneficiary(
            make_budget(BudgetStatus::Active, 200_000, 5_000),
            user,
            Some(1_000),
        );
        // Both constraints violated; the allocation cap reports first.
        assert!(matches!(
            BudgetService::validate_spend(&budget, user, 0, 10_000),
            Err(BudgetError::AllocationExceeded { .. })
        ));
    }
}

mod closure {
    use super::*;

    #[test]
    fn test_closure_returns_remainder() {
        let budget = make_budget(BudgetStatus::Active, 200_000, 75_000);
        let plan = BudgetService::plan_closure(&budget).unwrap();
        assert_eq!(plan.remainder, 75_000);
    }

    #[test]
    fn test_pending_budget_closes_with_zero_remainder() {
        let budget = make_budget(BudgetStatus::Pending, 200_000, 0);
        let plan = BudgetService::plan_closure(&budget).unwrap();
        assert_eq!(plan.remainder, 0);
    }

    #[test]
    fn test_closed_budget_cannot_close_again() {
        let budget = make_budget(BudgetStatus::Closed, 200_000, 0);
        assert!(matches!(
            BudgetService::plan_closure(&budget),
            Err(BudgetError::InvalidTransition { .. })
        ));
    }
}

mod extension {
    use super::*;

    #[test]
    fn test_extension_raises_amount_and_balance() {
        let budget = make_budget(BudgetStatus::Active, 200_000, 50_000);
        let plan = BudgetService::plan_extension(&budget, 100_000).unwrap();
        assert_eq!(plan.amount, 300_000);
        assert_eq!(plan.balance, 150_000);
    }

    #[test]
    fn test_extension_requires_positive_amount() {
        let budget = make_budget(BudgetStatus::Active, 200_000, 50_000);
        assert!(matches!(
            BudgetService::plan_extension(&budget, 0),
            Err(BudgetError::InvalidExtensionAmount)
        ));
        assert!(matches!(
            BudgetService::plan_extension(&budget, -5),
            Err(BudgetError::InvalidExtensionAmount)
        ));
    }

    #[test]
    fn test_extension_requires_active_budget() {
        let budget = make_budget(BudgetStatus::Pending, 200_000, 0);
        assert!(matches!(
            BudgetService::plan_extension(&budget, 100_000),
            Err(BudgetError::NotActive(BudgetStatus::Pending))
        ));
    }
}

mod pause {
    use super::*;

    #[test]
    fn test_pause_unpause_cycle() {
        assert!(BudgetService::validate_pause(BudgetStatus::Active).is_ok());
        assert!(BudgetService::validate_unpause(BudgetStatus::Paused).is_ok());
    }

    #[test]
    fn test_invalid_pause_transitions() {
        assert!(BudgetService::validate_pause(BudgetStatus::Pending).is_err());
        assert!(BudgetService::validate_pause(BudgetStatus::Closed).is_err());
        assert!(BudgetService::validate_unpause(BudgetStatus::Active).is_err());
    }
}

mod threshold {
    use super::*;

    #[test]
    fn test_threshold_crossing() {
        let mut budget = make_budget(BudgetStatus::Active, 200_000, 60_000);
        budget.threshold = Some(50_000);

        assert!(BudgetService::crosses_threshold(&budget, 45_000));
        assert!(BudgetService::crosses_threshold(&budget, 50_000));
        assert!(!BudgetService::crosses_threshold(&budget, 55_000));
    }

    #[test]
    fn test_no_threshold_never_crosses() {
        let budget = make_budget(BudgetStatus::Active, 200_000, 60_000);
        assert!(!BudgetService::crosses_threshold(&budget, 0));
    }

    #[test]
    fn test_already_below_threshold_does_not_renotify() {
        let mut budget = make_budget(BudgetStatus::Active, 200_000, 40_000);
        budget.threshold = Some(50_000);
        assert!(!BudgetService::crosses_threshold(&budget, 30_000));
    }
}
