//! Policy evaluation engine.
//!
//! Pure logic: the rolling-window spend sum is injected as a closure so the
//! engine stays free of database dependencies, the same way the ledger
//! service takes its lookups.

use super::types::{
    PolicyDecision, PolicyKind, SpendQuery, TransferContext, TransferPolicy,
};

/// Stateless engine for evaluating transfer policies.
pub struct PolicyEngine;

impl PolicyEngine {
    /// Evaluates every matching policy against a transfer.
    ///
    /// Each policy family is evaluated independently; any matching policy
    /// blocks its family. `spend_sum` returns the user's successful+pending
    /// entry total for the queried window, in minor units.
    ///
    /// # Arguments
    /// * `policies` - The organization's transfer policies
    /// * `ctx` - The transfer being evaluated
    /// * `spend_sum` - Rolling-window spend lookup
    #[must_use]
    pub fn check_transfer_policy<F>(
        policies: &[TransferPolicy],
        ctx: &TransferContext,
        spend_sum: F,
    ) -> PolicyDecision
    where
        F: Fn(&SpendQuery) -> i64,
    {
        let mut decision = PolicyDecision::default();

        for policy in policies.iter().filter(|p| p.scope.matches(ctx)) {
            match &policy.kind {
                PolicyKind::Calendar { days_of_week } => {
                    if !decision.calendar && days_of_week.contains(&ctx.today) {
                        decision.calendar = true;
                    }
                }
                PolicyKind::SpendLimit { window, amount } => {
                    if !decision.spend_limit {
                        let spent = spend_sum(&SpendQuery {
                            user_id: ctx.user_id,
                            budget_id: ctx.budget_id,
                            window: *window,
                        });
                        if spent.saturating_add(ctx.amount) >= *amount {
                            decision.spend_limit = true;
                        }
                    }
                }
                PolicyKind::Invoice => {
                    if !ctx.has_invoice {
                        decision.invoice = true;
                    }
                }
            }
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::{PolicyScope, PolicyWindow};
    use chrono::Weekday;
    use velora_shared::types::{BudgetId, OrganizationId, TransferPolicyId, UserId};

    fn ctx(amount: i64, today: Weekday) -> TransferContext {
        TransferContext {
            user_id: UserId::new(),
            budget_id: None,
            department: None,
            bank_code: "058".to_string(),
            account_number: "0123456789".to_string(),
            amount,
            has_invoice: false,
            today,
        }
    }

    fn policy(kind: PolicyKind) -> TransferPolicy {
        TransferPolicy {
            id: TransferPolicyId::new(),
            organization_id: OrganizationId::new(),
            kind,
            scope: PolicyScope::default(),
        }
    }

    fn no_spend(_q: &SpendQuery) -> i64 {
        0
    }

    #[test]
    fn test_no_policies_allows() {
        let decision = PolicyEngine::check_transfer_policy(&[], &ctx(10_000, Weekday::Mon), no_spend);
        assert!(!decision.is_blocked());
    }

    #[test]
    fn test_calendar_blocks_on_configured_weekday() {
        let policies = vec![policy(PolicyKind::Calendar {
            days_of_week: vec![Weekday::Sat, Weekday::Sun],
        })];

        let blocked =
            PolicyEngine::check_transfer_policy(&policies, &ctx(10_000, Weekday::Sat), no_spend);
        assert!(blocked.calendar);

        let allowed =
            PolicyEngine::check_transfer_policy(&policies, &ctx(10_000, Weekday::Wed), no_spend);
        assert!(!allowed.calendar);
    }

    #[test]
    fn test_spend_limit_blocks_at_boundary() {
        let policies = vec![policy(PolicyKind::SpendLimit {
            window: PolicyWindow::Daily,
            amount: 100_000,
        })];

        // spent 60_000 + requested 40_000 == limit -> blocked (>= semantics)
        let blocked = PolicyEngine::check_transfer_policy(
            &policies,
            &ctx(40_000, Weekday::Mon),
            |_q| 60_000,
        );
        assert!(blocked.spend_limit);

        // spent 60_000 + requested 39_999 < limit -> allowed
        let allowed = PolicyEngine::check_transfer_policy(
            &policies,
            &ctx(39_999, Weekday::Mon),
            |_q| 60_000,
        );
        assert!(!allowed.spend_limit);
    }

    #[test]
    fn test_spend_limit_query_carries_window_and_budget() {
        let budget = BudgetId::new();
        let policies = vec![policy(PolicyKind::SpendLimit {
            window: PolicyWindow::Weekly,
            amount: 1,
        })];
        let mut context = ctx(1, Weekday::Mon);
        context.budget_id = Some(budget);

        PolicyEngine::check_transfer_policy(&policies, &context, |q| {
            assert_eq!(q.window, PolicyWindow::Weekly);
            assert_eq!(q.budget_id, Some(budget));
            0
        });
    }

    #[test]
    fn test_invoice_policy_blocks_without_invoice() {
        let policies = vec![policy(PolicyKind::Invoice)];

        let blocked =
            PolicyEngine::check_transfer_policy(&policies, &ctx(10_000, Weekday::Mon), no_spend);
        assert!(blocked.invoice);

        let mut with_invoice = ctx(10_000, Weekday::Mon);
        with_invoice.has_invoice = true;
        let allowed = PolicyEngine::check_transfer_policy(&policies, &with_invoice, no_spend);
        assert!(!allowed.invoice);
    }

    #[test]
    fn test_scoped_policy_skipped_when_not_matching() {
        let mut scoped = policy(PolicyKind::Invoice);
        scoped.scope = PolicyScope {
            department: Some("finance".to_string()),
            ..Default::default()
        };

        let decision =
            PolicyEngine::check_transfer_policy(&[scoped], &ctx(10_000, Weekday::Mon), no_spend);
        assert!(!decision.invoice);
    }

    #[test]
    fn test_families_evaluated_independently() {
        let policies = vec![
            policy(PolicyKind::Calendar {
                days_of_week: vec![Weekday::Mon],
            }),
            policy(PolicyKind::SpendLimit {
                window: PolicyWindow::Monthly,
                amount: 5_000,
            }),
            policy(PolicyKind::Invoice),
        ];

        let decision =
            PolicyEngine::check_transfer_policy(&policies, &ctx(10_000, Weekday::Mon), no_spend);
        assert!(decision.calendar);
        assert!(decision.spend_limit);
        assert!(decision.invoice);
    }

    #[test]
    fn test_any_of_multiple_policies_blocks() {
        let mut weekend_only = policy(PolicyKind::Calendar {
            days_of_week: vec![Weekday::Sun],
        });
        weekend_only.scope = PolicyScope::default();
        let monday = policy(PolicyKind::Calendar {
            days_of_week: vec![Weekday::Mon],
        });

        let decision = PolicyEngine::check_transfer_policy(
            &[weekend_only, monday],
            &ctx(10_000, Weekday::Mon),
            no_spend,
        );
        assert!(decision.calendar);
    }
}
