//! Transfer policy domain types.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use velora_shared::types::{BudgetId, OrganizationId, TransferPolicyId, UserId};

/// Rolling window for spend-limit policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyWindow {
    /// Last 1 day.
    Daily,
    /// Last 7 days.
    Weekly,
    /// Last 30 days.
    Monthly,
}

impl PolicyWindow {
    /// Window length in days.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }

    /// Returns the string representation of the window.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a window from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// What a policy checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    /// Blocks transfers on the listed weekdays.
    Calendar {
        /// Blocked weekdays.
        days_of_week: Vec<Weekday>,
    },
    /// Blocks when `window spend + requested >= amount`.
    SpendLimit {
        /// Rolling window.
        window: PolicyWindow,
        /// Spend ceiling in minor units.
        amount: i64,
    },
    /// Requires an attached invoice.
    Invoice,
}

/// Scope restricting where a policy applies.
///
/// A policy with no populated scope field applies unconditionally;
/// otherwise it applies when the transfer matches any populated field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyScope {
    /// Department the policy is limited to.
    pub department: Option<String>,
    /// Budget the policy is limited to.
    pub budget_id: Option<BudgetId>,
    /// Recipient bank code the policy is limited to.
    pub recipient_bank_code: Option<String>,
    /// Recipient account number the policy is limited to.
    pub recipient_account_number: Option<String>,
}

impl PolicyScope {
    /// Returns true when no scope field is populated.
    #[must_use]
    pub fn is_unscoped(&self) -> bool {
        self.department.is_none()
            && self.budget_id.is_none()
            && self.recipient_bank_code.is_none()
            && self.recipient_account_number.is_none()
    }

    /// Returns true when the policy applies to the given transfer.
    #[must_use]
    pub fn matches(&self, ctx: &TransferContext) -> bool {
        if self.is_unscoped() {
            return true;
        }

        let department_match = match (&self.department, &ctx.department) {
            (Some(scope), Some(dept)) => scope == dept,
            _ => false,
        };
        let budget_match = match (self.budget_id, ctx.budget_id) {
            (Some(scope), Some(budget)) => scope == budget,
            _ => false,
        };
        let recipient_match = match (&self.recipient_bank_code, &self.recipient_account_number) {
            (None, None) => false,
            (bank, account) => {
                bank.as_ref().is_none_or(|b| *b == ctx.bank_code)
                    && account.as_ref().is_none_or(|a| *a == ctx.account_number)
                    && (bank.is_some() || account.is_some())
            }
        };

        department_match || budget_match || recipient_match
    }
}

/// One organization-scoped transfer policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPolicy {
    /// Policy ID.
    pub id: TransferPolicyId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// What the policy checks.
    pub kind: PolicyKind,
    /// Where the policy applies.
    pub scope: PolicyScope,
}

/// The transfer being evaluated.
#[derive(Debug, Clone)]
pub struct TransferContext {
    /// The user initiating the transfer.
    pub user_id: UserId,
    /// Budget being spent from, when budget-scoped.
    pub budget_id: Option<BudgetId>,
    /// The user's department, when known.
    pub department: Option<String>,
    /// Recipient bank code.
    pub bank_code: String,
    /// Recipient account number.
    pub account_number: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Whether an invoice document was attached.
    pub has_invoice: bool,
    /// Weekday of the evaluation instant (UTC).
    pub today: Weekday,
}

/// Spend-sum query the engine hands to its lookup closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendQuery {
    /// The spender.
    pub user_id: UserId,
    /// Budget restriction, when the evaluated transfer is budget-scoped.
    pub budget_id: Option<BudgetId>,
    /// Rolling window to sum over.
    pub window: PolicyWindow,
}

/// Outcome of policy evaluation; `true` means "blocked".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Blocked by a calendar policy.
    pub calendar: bool,
    /// Blocked by a spend-limit policy.
    pub spend_limit: bool,
    /// Blocked by an invoice-required policy.
    pub invoice: bool,
}

impl PolicyDecision {
    /// Returns true when any policy blocks the transfer.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.calendar || self.spend_limit || self.invoice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TransferContext {
        TransferContext {
            user_id: UserId::new(),
            budget_id: None,
            department: None,
            bank_code: "058".to_string(),
            account_number: "0123456789".to_string(),
            amount: 10_000,
            has_invoice: false,
            today: Weekday::Mon,
        }
    }

    #[test]
    fn test_window_days() {
        assert_eq!(PolicyWindow::Daily.days(), 1);
        assert_eq!(PolicyWindow::Weekly.days(), 7);
        assert_eq!(PolicyWindow::Monthly.days(), 30);
    }

    #[test]
    fn test_unscoped_policy_always_matches() {
        assert!(PolicyScope::default().matches(&ctx()));
    }

    #[test]
    fn test_department_scope() {
        let scope = PolicyScope {
            department: Some("engineering".to_string()),
            ..Default::default()
        };
        assert!(!scope.matches(&ctx()));

        let mut matching = ctx();
        matching.department = Some("engineering".to_string());
        assert!(scope.matches(&matching));
    }

    #[test]
    fn test_budget_scope() {
        let budget = BudgetId::new();
        let scope = PolicyScope {
            budget_id: Some(budget),
            ..Default::default()
        };
        let mut matching = ctx();
        matching.budget_id = Some(budget);
        assert!(scope.matches(&matching));

        matching.budget_id = Some(BudgetId::new());
        assert!(!scope.matches(&matching));
    }

    #[test]
    fn test_recipient_scope_requires_both_fields_when_set() {
        let scope = PolicyScope {
            recipient_bank_code: Some("058".to_string()),
            recipient_account_number: Some("0123456789".to_string()),
            ..Default::default()
        };
        assert!(scope.matches(&ctx()));

        let mut other = ctx();
        other.account_number = "9999999999".to_string();
        assert!(!scope.matches(&other));
    }

    #[test]
    fn test_recipient_scope_bank_code_only() {
        let scope = PolicyScope {
            recipient_bank_code: Some("058".to_string()),
            ..Default::default()
        };
        assert!(scope.matches(&ctx()));

        let mut other = ctx();
        other.bank_code = "044".to_string();
        assert!(!scope.matches(&other));
    }

    #[test]
    fn test_decision_blocking() {
        assert!(!PolicyDecision::default().is_blocked());
        assert!(
            PolicyDecision {
                spend_limit: true,
                ..Default::default()
            }
            .is_blocked()
        );
    }
}
