//! Property-based tests for quorum evaluation.

use proptest::prelude::*;
use uuid::Uuid;

use velora_shared::types::UserId;

use crate::approval::service::ApprovalEngine;
use crate::approval::types::{ApprovalType, RequestStatus, Review, ReviewStatus};

fn arb_review_status() -> impl Strategy<Value = ReviewStatus> {
    prop_oneof![
        Just(ReviewStatus::Pending),
        Just(ReviewStatus::Approved),
        Just(ReviewStatus::Declined),
    ]
}

fn arb_reviews(max: usize) -> impl Strategy<Value = Vec<Review>> {
    prop::collection::vec(
        (any::<u128>(), arb_review_status()).prop_map(|(id, status)| Review {
            reviewer: UserId::from_uuid(Uuid::from_u128(id)),
            status,
            reason: None,
            reviewed_at: None,
        }),
        1..=max,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any decline resolves the request Declined regardless of quorum type.
    #[test]
    fn prop_decline_dominates(reviews in arb_reviews(8)) {
        let has_decline = reviews.iter().any(|r| r.status == ReviewStatus::Declined);
        for approval_type in [ApprovalType::Everyone, ApprovalType::Anyone] {
            let status = ApprovalEngine::evaluate(approval_type, &reviews);
            if has_decline {
                prop_assert_eq!(status, RequestStatus::Declined);
            } else {
                prop_assert_ne!(status, RequestStatus::Declined);
            }
        }
    }

    /// Everyone approves iff every review is approved.
    #[test]
    fn prop_everyone_requires_all(reviews in arb_reviews(8)) {
        let status = ApprovalEngine::evaluate(ApprovalType::Everyone, &reviews);
        let all_approved = reviews.iter().all(|r| r.status == ReviewStatus::Approved);
        prop_assert_eq!(status == RequestStatus::Approved, all_approved);
    }

    /// Anyone approves iff at least one approval exists and none declined.
    #[test]
    fn prop_anyone_first_approval(reviews in arb_reviews(8)) {
        let status = ApprovalEngine::evaluate(ApprovalType::Anyone, &reviews);
        let any_approved = reviews.iter().any(|r| r.status == ReviewStatus::Approved);
        let any_declined = reviews.iter().any(|r| r.status == ReviewStatus::Declined);
        prop_assert_eq!(
            status == RequestStatus::Approved,
            any_approved && !any_declined
        );
    }

    /// Evaluation is a pure function of its inputs.
    #[test]
    fn prop_evaluate_deterministic(reviews in arb_reviews(8)) {
        for approval_type in [ApprovalType::Everyone, ApprovalType::Anyone] {
            prop_assert_eq!(
                ApprovalEngine::evaluate(approval_type, &reviews),
                ApprovalEngine::evaluate(approval_type, &reviews)
            );
        }
    }
}
