//! Approval workflow error types.

use thiserror::Error;
use uuid::Uuid;

use super::types::RequestStatus;

/// Errors that can occur during approval operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Approval request not found.
    #[error("Approval request not found: {0}")]
    RequestNotFound(Uuid),

    /// Approval rule not found.
    #[error("Approval rule not found: {0}")]
    RuleNotFound(Uuid),

    /// The user is not a reviewer on the request.
    #[error("User {0} is not a reviewer on this request")]
    NotAReviewer(Uuid),

    /// The reviewer has already submitted a decision.
    #[error("User {0} has already reviewed this request")]
    AlreadyReviewed(Uuid),

    /// The request has already resolved.
    #[error("Request already resolved with status {status}")]
    AlreadyResolved {
        /// The terminal status the request holds.
        status: RequestStatus,
    },

    /// A decline requires a reason.
    #[error("Decline reason is required")]
    DeclineReasonRequired,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RequestNotFound(_) => "APPROVAL_REQUEST_NOT_FOUND",
            Self::RuleNotFound(_) => "APPROVAL_RULE_NOT_FOUND",
            Self::NotAReviewer(_) => "NOT_A_REVIEWER",
            Self::AlreadyReviewed(_) => "ALREADY_REVIEWED",
            Self::AlreadyResolved { .. } => "REQUEST_ALREADY_RESOLVED",
            Self::DeclineReasonRequired => "DECLINE_REASON_REQUIRED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RequestNotFound(_) | Self::RuleNotFound(_) => 404,
            Self::NotAReviewer(_) => 403,
            Self::AlreadyReviewed(_) | Self::AlreadyResolved { .. } => 409,
            Self::DeclineReasonRequired => 400,
            Self::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApprovalError::NotAReviewer(Uuid::nil()).error_code(),
            "NOT_A_REVIEWER"
        );
        assert_eq!(
            ApprovalError::AlreadyResolved {
                status: RequestStatus::Approved,
            }
            .error_code(),
            "REQUEST_ALREADY_RESOLVED"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApprovalError::RequestNotFound(Uuid::nil()).status_code(),
            404
        );
        assert_eq!(ApprovalError::NotAReviewer(Uuid::nil()).status_code(), 403);
        assert_eq!(
            ApprovalError::AlreadyReviewed(Uuid::nil()).status_code(),
            409
        );
        assert_eq!(ApprovalError::DeclineReasonRequired.status_code(), 400);
    }
}
