//! Rule matching and reviewer quorum evaluation.
//!
//! Stateless logic over rule and review slices; persistence and the
//! deferred-action dispatch live in the repository layer.

use chrono::Utc;

use velora_shared::types::UserId;

use super::error::ApprovalError;
use super::types::{ApprovalRule, ApprovalType, RequestStatus, Review, ReviewStatus, WorkflowType};

/// A reviewer's decision on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Approve the request.
    Approve,
    /// Decline the request (terminal).
    Decline,
}

/// Stateless engine for approval rules and quorum.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Finds the best-matching rule for an action.
    ///
    /// A rule matches when the workflow types agree and
    /// `amount <= rule.amount`; among matches the smallest ceiling wins.
    #[must_use]
    pub fn match_rule<'a>(
        rules: &'a [ApprovalRule],
        workflow_type: WorkflowType,
        amount: i64,
    ) -> Option<&'a ApprovalRule> {
        rules
            .iter()
            .filter(|r| r.workflow_type == workflow_type && amount <= r.amount)
            .min_by_key(|r| r.amount)
    }

    /// Decides whether the action must go through review.
    ///
    /// Execution is immediate when no rule matches, when the requester is
    /// the organization owner, or when the rule's reviewers reduce to the
    /// requester alone.
    #[must_use]
    pub fn requires_approval(
        rule: Option<&ApprovalRule>,
        requester: UserId,
        organization_owner: UserId,
    ) -> bool {
        let Some(rule) = rule else {
            return false;
        };

        if requester == organization_owner {
            return false;
        }

        rule.reviewers.iter().any(|r| *r != requester)
    }

    /// Seeds review slots from a rule's reviewers.
    ///
    /// The requester's own slot, when present, is pre-marked approved.
    #[must_use]
    pub fn seed_reviews(rule: &ApprovalRule, requester: UserId) -> Vec<Review> {
        let mut seen = Vec::with_capacity(rule.reviewers.len());
        let mut reviews = Vec::with_capacity(rule.reviewers.len());

        for reviewer in &rule.reviewers {
            if seen.contains(reviewer) {
                continue;
            }
            seen.push(*reviewer);

            let is_requester = *reviewer == requester;
            reviews.push(Review {
                reviewer: *reviewer,
                status: if is_requester {
                    ReviewStatus::Approved
                } else {
                    ReviewStatus::Pending
                },
                reason: None,
                reviewed_at: is_requester.then(Utc::now),
            });
        }

        reviews
    }

    /// Applies one reviewer's decision to the review slots.
    ///
    /// # Errors
    ///
    /// - `NotAReviewer` when the user has no slot
    /// - `AlreadyReviewed` when their slot already holds a decision
    /// - `DeclineReasonRequired` when declining without a reason
    pub fn apply_review(
        reviews: &mut [Review],
        reviewer: UserId,
        decision: ReviewDecision,
        reason: Option<String>,
    ) -> Result<(), ApprovalError> {
        if decision == ReviewDecision::Decline
            && reason.as_deref().is_none_or(|r| r.trim().is_empty())
        {
            return Err(ApprovalError::DeclineReasonRequired);
        }

        let review = reviews
            .iter_mut()
            .find(|r| r.reviewer == reviewer)
            .ok_or(ApprovalError::NotAReviewer(reviewer.into_inner()))?;

        if review.status != ReviewStatus::Pending {
            return Err(ApprovalError::AlreadyReviewed(reviewer.into_inner()));
        }

        review.status = match decision {
            ReviewDecision::Approve => ReviewStatus::Approved,
            ReviewDecision::Decline => ReviewStatus::Declined,
        };
        review.reason = reason;
        review.reviewed_at = Some(Utc::now());

        Ok(())
    }

    /// Evaluates the overall request status from its review slots.
    ///
    /// A single decline resolves the request Declined. For `Anyone` the
    /// first approval resolves Approved even while other reviews are still
    /// pending; for `Everyone` approval requires every slot approved.
    #[must_use]
    pub fn evaluate(approval_type: ApprovalType, reviews: &[Review]) -> RequestStatus {
        if reviews
            .iter()
            .any(|r| r.status == ReviewStatus::Declined)
        {
            return RequestStatus::Declined;
        }

        let approved = reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .count();

        match approval_type {
            ApprovalType::Anyone if approved >= 1 => RequestStatus::Approved,
            ApprovalType::Everyone if approved == reviews.len() && !reviews.is_empty() => {
                RequestStatus::Approved
            }
            _ => RequestStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velora_shared::types::{ApprovalRuleId, OrganizationId};

    fn rule(
        workflow_type: WorkflowType,
        approval_type: ApprovalType,
        amount: i64,
        reviewers: Vec<UserId>,
    ) -> ApprovalRule {
        ApprovalRule {
            id: ApprovalRuleId::new(),
            organization_id: OrganizationId::new(),
            workflow_type,
            approval_type,
            amount,
            reviewers,
        }
    }

    #[test]
    fn test_match_rule_by_amount_ceiling() {
        let rules = vec![
            rule(WorkflowType::Transaction, ApprovalType::Anyone, 100_000, vec![]),
            rule(WorkflowType::Transaction, ApprovalType::Everyone, 10_000, vec![]),
        ];

        // Small amount matches both; the tighter ceiling wins.
        let matched = ApprovalEngine::match_rule(&rules, WorkflowType::Transaction, 5_000).unwrap();
        assert_eq!(matched.amount, 10_000);

        // Larger amount matches only the wide rule.
        let matched = ApprovalEngine::match_rule(&rules, WorkflowType::Transaction, 50_000).unwrap();
        assert_eq!(matched.amount, 100_000);

        // Beyond every ceiling: no rule applies.
        assert!(ApprovalEngine::match_rule(&rules, WorkflowType::Transaction, 200_000).is_none());
    }

    #[test]
    fn test_match_rule_filters_workflow_type() {
        let rules = vec![rule(
            WorkflowType::Expense,
            ApprovalType::Anyone,
            100_000,
            vec![],
        )];
        assert!(ApprovalEngine::match_rule(&rules, WorkflowType::Payroll, 5_000).is_none());
    }

    #[test]
    fn test_requires_approval_no_rule() {
        assert!(!ApprovalEngine::requires_approval(
            None,
            UserId::new(),
            UserId::new()
        ));
    }

    #[test]
    fn test_requires_approval_owner_bypasses() {
        let owner = UserId::new();
        let r = rule(
            WorkflowType::Transaction,
            ApprovalType::Everyone,
            100_000,
            vec![UserId::new()],
        );
        assert!(!ApprovalEngine::requires_approval(Some(&r), owner, owner));
    }

    #[test]
    fn test_requires_approval_requester_only_reviewer() {
        let requester = UserId::new();
        let r = rule(
            WorkflowType::Transaction,
            ApprovalType::Everyone,
            100_000,
            vec![requester],
        );
        assert!(!ApprovalEngine::requires_approval(
            Some(&r),
            requester,
            UserId::new()
        ));
    }

    #[test]
    fn test_requires_approval_with_other_reviewers() {
        let requester = UserId::new();
        let r = rule(
            WorkflowType::Transaction,
            ApprovalType::Everyone,
            100_000,
            vec![requester, UserId::new()],
        );
        assert!(ApprovalEngine::requires_approval(
            Some(&r),
            requester,
            UserId::new()
        ));
    }

    #[test]
    fn test_seed_reviews_pre_approves_requester() {
        let requester = UserId::new();
        let other = UserId::new();
        let r = rule(
            WorkflowType::Transaction,
            ApprovalType::Everyone,
            100_000,
            vec![requester, other],
        );

        let reviews = ApprovalEngine::seed_reviews(&r, requester);
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].reviewer, requester);
        assert_eq!(reviews[0].status, ReviewStatus::Approved);
        assert!(reviews[0].reviewed_at.is_some());
        assert_eq!(reviews[1].reviewer, other);
        assert_eq!(reviews[1].status, ReviewStatus::Pending);
    }

    #[test]
    fn test_seed_reviews_dedupes_reviewers() {
        let a = UserId::new();
        let r = rule(
            WorkflowType::Transaction,
            ApprovalType::Everyone,
            100_000,
            vec![a, a],
        );
        assert_eq!(ApprovalEngine::seed_reviews(&r, UserId::new()).len(), 1);
    }

    #[test]
    fn test_apply_review_approve() {
        let reviewer = UserId::new();
        let mut reviews = vec![Review {
            reviewer,
            status: ReviewStatus::Pending,
            reason: None,
            reviewed_at: None,
        }];

        ApprovalEngine::apply_review(&mut reviews, reviewer, ReviewDecision::Approve, None)
            .unwrap();
        assert_eq!(reviews[0].status, ReviewStatus::Approved);
        assert!(reviews[0].reviewed_at.is_some());
    }

    #[test]
    fn test_apply_review_not_a_reviewer() {
        let mut reviews = vec![Review {
            reviewer: UserId::new(),
            status: ReviewStatus::Pending,
            reason: None,
            reviewed_at: None,
        }];

        let result = ApprovalEngine::apply_review(
            &mut reviews,
            UserId::new(),
            ReviewDecision::Approve,
            None,
        );
        assert!(matches!(result, Err(ApprovalError::NotAReviewer(_))));
    }

    #[test]
    fn test_apply_review_twice_rejected() {
        let reviewer = UserId::new();
        let mut reviews = vec![Review {
            reviewer,
            status: ReviewStatus::Approved,
            reason: None,
            reviewed_at: None,
        }];

        let result =
            ApprovalEngine::apply_review(&mut reviews, reviewer, ReviewDecision::Approve, None);
        assert!(matches!(result, Err(ApprovalError::AlreadyReviewed(_))));
    }

    #[test]
    fn test_apply_review_decline_requires_reason() {
        let reviewer = UserId::new();
        let mut reviews = vec![Review {
            reviewer,
            status: ReviewStatus::Pending,
            reason: None,
            reviewed_at: None,
        }];

        assert!(matches!(
            ApprovalEngine::apply_review(&mut reviews, reviewer, ReviewDecision::Decline, None),
            Err(ApprovalError::DeclineReasonRequired)
        ));
        assert!(matches!(
            ApprovalEngine::apply_review(
                &mut reviews,
                reviewer,
                ReviewDecision::Decline,
                Some("   ".to_string())
            ),
            Err(ApprovalError::DeclineReasonRequired)
        ));

        ApprovalEngine::apply_review(
            &mut reviews,
            reviewer,
            ReviewDecision::Decline,
            Some("over budget".to_string()),
        )
        .unwrap();
        assert_eq!(reviews[0].status, ReviewStatus::Declined);
    }

    fn review(status: ReviewStatus) -> Review {
        Review {
            reviewer: UserId::new(),
            status,
            reason: None,
            reviewed_at: None,
        }
    }

    #[test]
    fn test_evaluate_everyone_requires_all() {
        let reviews = vec![
            review(ReviewStatus::Approved),
            review(ReviewStatus::Pending),
        ];
        assert_eq!(
            ApprovalEngine::evaluate(ApprovalType::Everyone, &reviews),
            RequestStatus::Pending
        );

        let reviews = vec![
            review(ReviewStatus::Approved),
            review(ReviewStatus::Approved),
        ];
        assert_eq!(
            ApprovalEngine::evaluate(ApprovalType::Everyone, &reviews),
            RequestStatus::Approved
        );
    }

    #[test]
    fn test_evaluate_anyone_first_approval_wins() {
        let reviews = vec![
            review(ReviewStatus::Approved),
            review(ReviewStatus::Pending),
            review(ReviewStatus::Pending),
        ];
        assert_eq!(
            ApprovalEngine::evaluate(ApprovalType::Anyone, &reviews),
            RequestStatus::Approved
        );
    }

    #[test]
    fn test_evaluate_single_decline_terminal() {
        let reviews = vec![
            review(ReviewStatus::Approved),
            review(ReviewStatus::Declined),
        ];
        assert_eq!(
            ApprovalEngine::evaluate(ApprovalType::Anyone, &reviews),
            RequestStatus::Declined
        );
        assert_eq!(
            ApprovalEngine::evaluate(ApprovalType::Everyone, &reviews),
            RequestStatus::Declined
        );
    }

    #[test]
    fn test_evaluate_empty_reviews_pending() {
        assert_eq!(
            ApprovalEngine::evaluate(ApprovalType::Everyone, &[]),
            RequestStatus::Pending
        );
    }
}
