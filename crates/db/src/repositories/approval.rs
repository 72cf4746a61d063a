//! Approval repository: rules, requests, reviews, quorum resolution.
//!
//! The repository persists requests and reviews; the quorum decisions come
//! from the core engine. Dispatching an approved payload belongs to the
//! ledger engine, which receives the typed properties from `ReviewOutcome`.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use velora_core::approval::{
    ApprovalEngine, ApprovalError, ApprovalProperties, ApprovalRequest, ApprovalRule,
    ApprovalType, RequestStatus, Review, ReviewDecision, ReviewStatus, WorkflowType,
};
use velora_shared::types::{
    ApprovalRequestId, ApprovalRuleId, OrganizationId, UserId,
};

use crate::entities::{
    approval_requests, approval_reviews, approval_rule_reviewers, approval_rules, organizations,
    sea_orm_active_enums::{
        ApprovalType as DbApprovalType, RequestStatus as DbRequestStatus,
        ReviewStatus as DbReviewStatus, WorkflowType as DbWorkflowType,
    },
};

/// Input for creating an approval rule.
#[derive(Debug, Clone)]
pub struct CreateRuleInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Workflow the rule governs.
    pub workflow_type: WorkflowType,
    /// Required quorum.
    pub approval_type: ApprovalType,
    /// Amount ceiling in minor units.
    pub amount: i64,
    /// The reviewers the rule assigns, in display order.
    pub reviewers: Vec<Uuid>,
}

/// Outcome of `request_or_execute`.
#[derive(Debug, Clone)]
pub enum RequestOrExecute {
    /// No quorum stands in the way: run the action now.
    ///
    /// Carries the resolved request when one was persisted (a request whose
    /// seeded reviews already met quorum).
    Execute {
        /// The pre-resolved request, when one exists.
        request: Option<ApprovalRequest>,
    },
    /// A request was persisted and awaits reviewers.
    PendingApproval(ApprovalRequest),
}

/// Outcome of applying one review.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The request after the review.
    pub request: ApprovalRequest,
    /// The payload to dispatch, present exactly when the review resolved
    /// the request Approved.
    pub dispatch: Option<ApprovalProperties>,
}

/// Approval repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an approval rule with its reviewers.
    pub async fn create_rule(
        &self,
        input: CreateRuleInput,
    ) -> Result<ApprovalRule, ApprovalError> {
        let txn = self.db.begin().await.map_err(approval_db_err)?;
        let now = Utc::now();
        let rule_id = Uuid::new_v4();

        approval_rules::ActiveModel {
            id: Set(rule_id),
            organization_id: Set(input.organization_id),
            workflow_type: Set(to_db_workflow(input.workflow_type)),
            approval_type: Set(to_db_approval_type(input.approval_type)),
            amount: Set(input.amount),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(approval_db_err)?;

        for (position, user_id) in input.reviewers.iter().enumerate() {
            approval_rule_reviewers::ActiveModel {
                id: Set(Uuid::new_v4()),
                approval_rule_id: Set(rule_id),
                user_id: Set(*user_id),
                position: Set(i16::try_from(position).unwrap_or(i16::MAX)),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(approval_db_err)?;
        }

        txn.commit().await.map_err(approval_db_err)?;

        Ok(ApprovalRule {
            id: ApprovalRuleId::from_uuid(rule_id),
            organization_id: OrganizationId::from_uuid(input.organization_id),
            workflow_type: input.workflow_type,
            approval_type: input.approval_type,
            amount: input.amount,
            reviewers: input.reviewers.iter().map(|u| UserId::from_uuid(*u)).collect(),
        })
    }

    /// Loads an organization's rules for a workflow, reviewers included.
    pub async fn list_rules(
        &self,
        organization_id: Uuid,
        workflow_type: WorkflowType,
    ) -> Result<Vec<ApprovalRule>, ApprovalError> {
        let rules = approval_rules::Entity::find()
            .filter(approval_rules::Column::OrganizationId.eq(organization_id))
            .filter(approval_rules::Column::WorkflowType.eq(to_db_workflow(workflow_type)))
            .all(&self.db)
            .await
            .map_err(approval_db_err)?;

        let mut result = Vec::with_capacity(rules.len());
        for rule in rules {
            let reviewers = approval_rule_reviewers::Entity::find()
                .filter(approval_rule_reviewers::Column::ApprovalRuleId.eq(rule.id))
                .order_by_asc(approval_rule_reviewers::Column::Position)
                .all(&self.db)
                .await
                .map_err(approval_db_err)?;

            result.push(ApprovalRule {
                id: ApprovalRuleId::from_uuid(rule.id),
                organization_id: OrganizationId::from_uuid(rule.organization_id),
                workflow_type,
                approval_type: to_core_approval_type(&rule.approval_type),
                amount: rule.amount,
                reviewers: reviewers
                    .iter()
                    .map(|r| UserId::from_uuid(r.user_id))
                    .collect(),
            });
        }
        Ok(result)
    }

    /// Matches a rule and either clears the action for immediate execution
    /// or persists a pending approval request.
    ///
    /// Immediate execution applies when no rule matches, the requester owns
    /// the organization, or the matched rule's reviewers reduce to the
    /// requester alone. A persisted request whose seeded reviews already
    /// meet quorum (an `Anyone` rule where the requester reviews) resolves
    /// Approved on the spot and also clears for execution.
    #[instrument(skip(self, properties), fields(workflow = %workflow_type))]
    pub async fn request_or_execute(
        &self,
        organization_id: Uuid,
        requester: Uuid,
        workflow_type: WorkflowType,
        amount: i64,
        properties: ApprovalProperties,
    ) -> Result<RequestOrExecute, ApprovalError> {
        let rules = self.list_rules(organization_id, workflow_type).await?;
        let Some(rule) = ApprovalEngine::match_rule(&rules, workflow_type, amount) else {
            return Ok(RequestOrExecute::Execute { request: None });
        };

        let owner = organizations::Entity::find_by_id(organization_id)
            .one(&self.db)
            .await
            .map_err(approval_db_err)?
            .map(|o| o.owner_user_id)
            .ok_or(ApprovalError::RequestNotFound(organization_id))?;

        let requester_id = UserId::from_uuid(requester);
        if !ApprovalEngine::requires_approval(Some(rule), requester_id, UserId::from_uuid(owner)) {
            return Ok(RequestOrExecute::Execute { request: None });
        }

        let reviews = ApprovalEngine::seed_reviews(rule, requester_id);
        let status = ApprovalEngine::evaluate(rule.approval_type, &reviews);

        let request = self
            .insert_request(organization_id, requester, rule, &reviews, status, &properties)
            .await?;

        info!(request_id = %request.id, status = %status, "approval request created");

        if status == RequestStatus::Approved {
            Ok(RequestOrExecute::Execute {
                request: Some(request),
            })
        } else {
            Ok(RequestOrExecute::PendingApproval(request))
        }
    }

    /// Applies one reviewer's decision and resolves quorum.
    ///
    /// Both writes are conditional updates: the review slot flips only out
    /// of pending, and the overall status flips only out of Pending. Two
    /// racing final approvals both see the full review set, but exactly
    /// one wins the status transition and carries the dispatch payload.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn review(
        &self,
        organization_id: Uuid,
        request_id: Uuid,
        reviewer: Uuid,
        decision: ReviewDecision,
        reason: Option<String>,
    ) -> Result<ReviewOutcome, ApprovalError> {
        let request = approval_requests::Entity::find_by_id(request_id)
            .filter(approval_requests::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
            .map_err(approval_db_err)?
            .ok_or(ApprovalError::RequestNotFound(request_id))?;

        let current_status = to_core_request_status(&request.status);
        if current_status.is_terminal() {
            return Err(ApprovalError::AlreadyResolved {
                status: current_status,
            });
        }

        let review_rows = approval_reviews::Entity::find()
            .filter(approval_reviews::Column::ApprovalRequestId.eq(request_id))
            .order_by_asc(approval_reviews::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(approval_db_err)?;

        // Validate against the core rules before touching anything.
        let mut reviews: Vec<Review> = review_rows.iter().map(to_core_review).collect();
        ApprovalEngine::apply_review(
            &mut reviews,
            UserId::from_uuid(reviewer),
            decision,
            reason.clone(),
        )?;

        let row = review_rows
            .iter()
            .find(|r| r.reviewer == reviewer)
            .ok_or(ApprovalError::NotAReviewer(reviewer))?;

        // Conditional flip of the review slot: a concurrent decision by
        // the same reviewer loses here.
        let now = Utc::now();
        let flipped = approval_reviews::Entity::update_many()
            .col_expr(
                approval_reviews::Column::Status,
                Expr::value(match decision {
                    ReviewDecision::Approve => DbReviewStatus::Approved,
                    ReviewDecision::Decline => DbReviewStatus::Declined,
                }),
            )
            .col_expr(approval_reviews::Column::Reason, Expr::value(reason))
            .col_expr(approval_reviews::Column::ReviewedAt, Expr::value(now))
            .filter(approval_reviews::Column::Id.eq(row.id))
            .filter(approval_reviews::Column::Status.eq(DbReviewStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(approval_db_err)?;

        if flipped.rows_affected == 0 {
            return Err(ApprovalError::AlreadyReviewed(reviewer));
        }

        // Re-read the full review set so racing reviewers are visible,
        // then resolve quorum.
        let reviews: Vec<Review> = approval_reviews::Entity::find()
            .filter(approval_reviews::Column::ApprovalRequestId.eq(request_id))
            .order_by_asc(approval_reviews::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(approval_db_err)?
            .iter()
            .map(to_core_review)
            .collect();

        let approval_type = to_core_approval_type(&request.approval_type);
        let status = ApprovalEngine::evaluate(approval_type, &reviews);

        // Only the review that wins the Pending -> terminal transition
        // dispatches the deferred action.
        let mut resolved_here = false;
        if status.is_terminal() {
            let updated = approval_requests::Entity::update_many()
                .col_expr(
                    approval_requests::Column::Status,
                    Expr::value(to_db_request_status(status)),
                )
                .col_expr(approval_requests::Column::ResolvedAt, Expr::value(now))
                .col_expr(approval_requests::Column::UpdatedAt, Expr::value(now))
                .filter(approval_requests::Column::Id.eq(request_id))
                .filter(approval_requests::Column::Status.eq(DbRequestStatus::Pending))
                .exec(&self.db)
                .await
                .map_err(approval_db_err)?;
            resolved_here = updated.rows_affected > 0;
        }

        info!(request_id = %request_id, status = %status, resolved_here, "review applied");

        let request = approval_requests::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map_err(approval_db_err)?
            .ok_or(ApprovalError::RequestNotFound(request_id))?;
        let core_request = to_core_request(&request, &reviews)?;

        let dispatch = (resolved_here && status == RequestStatus::Approved)
            .then(|| core_request.properties.clone());

        Ok(ReviewOutcome {
            request: core_request,
            dispatch,
        })
    }

    /// Loads a request with its reviews as a core domain value.
    pub async fn get_request(
        &self,
        organization_id: Uuid,
        request_id: Uuid,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let request = approval_requests::Entity::find_by_id(request_id)
            .filter(approval_requests::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
            .map_err(approval_db_err)?
            .ok_or(ApprovalError::RequestNotFound(request_id))?;

        let reviews: Vec<Review> = approval_reviews::Entity::find()
            .filter(approval_reviews::Column::ApprovalRequestId.eq(request_id))
            .order_by_asc(approval_reviews::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(approval_db_err)?
            .iter()
            .map(to_core_review)
            .collect();

        to_core_request(&request, &reviews)
    }

    async fn insert_request(
        &self,
        organization_id: Uuid,
        requester: Uuid,
        rule: &ApprovalRule,
        reviews: &[Review],
        status: RequestStatus,
        properties: &ApprovalProperties,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let txn = self.db.begin().await.map_err(approval_db_err)?;
        let now = Utc::now();
        let request_id = Uuid::new_v4();

        let properties_json = serde_json::to_value(properties)
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        let request = approval_requests::ActiveModel {
            id: Set(request_id),
            organization_id: Set(organization_id),
            workflow_type: Set(to_db_workflow(rule.workflow_type)),
            requester: Set(requester),
            approval_rule_id: Set(rule.id.into_inner()),
            approval_type: Set(to_db_approval_type(rule.approval_type)),
            status: Set(to_db_request_status(status)),
            properties: Set(properties_json),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            resolved_at: Set(status.is_terminal().then(|| now.into())),
        }
        .insert(&txn)
        .await
        .map_err(approval_db_err)?;

        for review in reviews {
            approval_reviews::ActiveModel {
                id: Set(Uuid::new_v4()),
                approval_request_id: Set(request_id),
                reviewer: Set(review.reviewer.into_inner()),
                status: Set(to_db_review_status(review.status)),
                reason: Set(review.reason.clone()),
                reviewed_at: Set(review.reviewed_at.map(Into::into)),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(approval_db_err)?;
        }

        txn.commit().await.map_err(approval_db_err)?;
        to_core_request(&request, reviews)
    }
}

// ===== enum and model mapping =====

fn to_db_workflow(wt: WorkflowType) -> DbWorkflowType {
    match wt {
        WorkflowType::Expense => DbWorkflowType::Expense,
        WorkflowType::Transaction => DbWorkflowType::Transaction,
        WorkflowType::BudgetExtension => DbWorkflowType::BudgetExtension,
        WorkflowType::Payroll => DbWorkflowType::Payroll,
    }
}

fn to_core_workflow(wt: &DbWorkflowType) -> WorkflowType {
    match wt {
        DbWorkflowType::Expense => WorkflowType::Expense,
        DbWorkflowType::Transaction => WorkflowType::Transaction,
        DbWorkflowType::BudgetExtension => WorkflowType::BudgetExtension,
        DbWorkflowType::Payroll => WorkflowType::Payroll,
    }
}

fn to_db_approval_type(at: ApprovalType) -> DbApprovalType {
    match at {
        ApprovalType::Everyone => DbApprovalType::Everyone,
        ApprovalType::Anyone => DbApprovalType::Anyone,
    }
}

pub(crate) fn to_core_approval_type(at: &DbApprovalType) -> ApprovalType {
    match at {
        DbApprovalType::Everyone => ApprovalType::Everyone,
        DbApprovalType::Anyone => ApprovalType::Anyone,
    }
}

fn to_db_request_status(status: RequestStatus) -> DbRequestStatus {
    match status {
        RequestStatus::Pending => DbRequestStatus::Pending,
        RequestStatus::Approved => DbRequestStatus::Approved,
        RequestStatus::Declined => DbRequestStatus::Declined,
    }
}

pub(crate) fn to_core_request_status(status: &DbRequestStatus) -> RequestStatus {
    match status {
        DbRequestStatus::Pending => RequestStatus::Pending,
        DbRequestStatus::Approved => RequestStatus::Approved,
        DbRequestStatus::Declined => RequestStatus::Declined,
    }
}

fn to_db_review_status(status: ReviewStatus) -> DbReviewStatus {
    match status {
        ReviewStatus::Pending => DbReviewStatus::Pending,
        ReviewStatus::Approved => DbReviewStatus::Approved,
        ReviewStatus::Declined => DbReviewStatus::Declined,
    }
}

fn to_core_review_status(status: &DbReviewStatus) -> ReviewStatus {
    match status {
        DbReviewStatus::Pending => ReviewStatus::Pending,
        DbReviewStatus::Approved => ReviewStatus::Approved,
        DbReviewStatus::Declined => ReviewStatus::Declined,
    }
}

fn to_core_review(row: &approval_reviews::Model) -> Review {
    Review {
        reviewer: UserId::from_uuid(row.reviewer),
        status: to_core_review_status(&row.status),
        reason: row.reason.clone(),
        reviewed_at: row.reviewed_at.map(|t| t.to_utc()),
    }
}

fn to_core_request(
    row: &approval_requests::Model,
    reviews: &[Review],
) -> Result<ApprovalRequest, ApprovalError> {
    let properties: ApprovalProperties = serde_json::from_value(row.properties.clone())
        .map_err(|e| ApprovalError::Database(format!("malformed properties payload: {e}")))?;

    Ok(ApprovalRequest {
        id: ApprovalRequestId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        workflow_type: to_core_workflow(&row.workflow_type),
        requester: UserId::from_uuid(row.requester),
        approval_rule_id: ApprovalRuleId::from_uuid(row.approval_rule_id),
        approval_type: to_core_approval_type(&row.approval_type),
        reviews: reviews.to_vec(),
        status: to_core_request_status(&row.status),
        properties,
        created_at: row.created_at.to_utc(),
        resolved_at: row.resolved_at.map(|t| t.to_utc()),
    })
}

fn approval_db_err(e: DbErr) -> ApprovalError {
    ApprovalError::Database(e.to_string())
}
