//! Approval workflow for money-moving actions.
//!
//! This module implements rule matching, reviewer quorum evaluation, and
//! the typed deferred-action payloads dispatched when a request resolves.
//!
//! # Modules
//!
//! - `types` - Rules, requests, reviews, and deferred-action payloads
//! - `error` - Approval-specific error types
//! - `service` - Rule matching and quorum state machine

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ApprovalError;
pub use service::{ApprovalEngine, ReviewDecision};
pub use types::{
    ApprovalProperties, ApprovalRequest, ApprovalRule, ApprovalType, RequestStatus, Review,
    ReviewStatus, WorkflowType,
};
