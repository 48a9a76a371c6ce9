use async_trait::async_trait;
use sqlx::{postgres::PgTransaction, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::{
    approval::{Approval, ApprovalDecision, ApprovalStatus, DecisionOutcome},
    request::{ProvisionRequest, RequestStatus},
};
use crate::repositories::{
    common::{push_clause, DEFAULT_PAGE_SIZE},
    request::REQUEST_COLUMNS,
    transaction::{abandon, begin_transaction, commit_transaction, lock_request},
};
use crate::types::{ApprovalId, RequestId};

pub(crate) const APPROVAL_COLUMNS: &str =
    "id, request_id, approver_id, status, comment, approved_at, created_at";

#[derive(Debug, Clone)]
pub struct ApprovalListFilters {
    /// `None` lists every status
    pub status: Option<ApprovalStatus>,
    pub request_id: Option<RequestId>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ApprovalListFilters {
    fn default() -> Self {
        Self {
            status: None,
            request_id: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Result of trying to persist an approver's verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionWrite {
    /// The approval and its request were both updated.
    Applied {
        approval: Approval,
        request: ProvisionRequest,
    },
    NotFound,
    /// The approval was no longer pending; nothing was written.
    AlreadyProcessed,
    /// The parent request left `pending` first; nothing was written.
    RequestNotPending,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApprovalRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: ApprovalId) -> Result<Option<Approval>, AppError>;

    async fn find_pending_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<Approval>, AppError>;

    async fn list(&self, filters: &ApprovalListFilters) -> Result<Vec<Approval>, AppError>;

    /// Record a verdict and mirror it onto the parent request as one unit.
    ///
    /// Both writes are conditional on `pending`, so of two racing decisions
    /// exactly one returns [`DecisionWrite::Applied`].
    async fn decide(
        &self,
        id: ApprovalId,
        decision: &ApprovalDecision,
    ) -> Result<DecisionWrite, AppError>;
}

/// Insert a pending approval inside an open transaction.
///
/// The partial unique index on `approvals(request_id) WHERE status = 'pending'`
/// turns a second pending approval into an internal error.
pub(crate) async fn insert_pending_approval(
    tx: &mut PgTransaction<'_>,
    approval: &Approval,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO approvals (id, request_id, approver_id, status, comment, approved_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(approval.id)
    .bind(approval.request_id)
    .bind(approval.approver_id)
    .bind(approval.status)
    .bind(&approval.comment)
    .bind(approval.approved_at)
    .bind(approval.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::internal(
            format!("request {} already has a pending approval", approval.request_id),
        ),
        other => other.into(),
    })?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgApprovalRepository {
    pool: PgPool,
}

impl PgApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalRepositoryTrait for PgApprovalRepository {
    async fn find_by_id(&self, id: ApprovalId) -> Result<Option<Approval>, AppError> {
        let query = format!("SELECT {} FROM approvals WHERE id = $1", APPROVAL_COLUMNS);
        let row = sqlx::query_as::<_, Approval>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_pending_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<Approval>, AppError> {
        let query = format!(
            "SELECT {} FROM approvals WHERE request_id = $1 AND status = 'pending'",
            APPROVAL_COLUMNS
        );
        let row = sqlx::query_as::<_, Approval>(&query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list(&self, filters: &ApprovalListFilters) -> Result<Vec<Approval>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM approvals", APPROVAL_COLUMNS));
        let mut has_clause = false;
        if let Some(status) = filters.status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status);
        }
        if let Some(request_id) = filters.request_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("request_id = ").push_bind(request_id);
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filters.limit)
            .push(" OFFSET ")
            .push_bind(filters.offset);

        let rows = builder
            .build_query_as::<Approval>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn decide(
        &self,
        id: ApprovalId,
        decision: &ApprovalDecision,
    ) -> Result<DecisionWrite, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let request_id: Option<RequestId> =
            sqlx::query_scalar("SELECT request_id FROM approvals WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(request_id) = request_id else {
            return abandon(tx, DecisionWrite::NotFound).await;
        };

        lock_request(&mut tx, request_id).await?;

        let query = format!(
            "UPDATE approvals SET status = $1, approver_id = $2, comment = $3, approved_at = $4 \
             WHERE id = $5 AND status = 'pending' RETURNING {}",
            APPROVAL_COLUMNS
        );
        let approval = sqlx::query_as::<_, Approval>(&query)
            .bind(decision.outcome.approval_status())
            .bind(decision.approver_id)
            .bind(&decision.comment)
            .bind(decision.decided_at)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(approval) = approval else {
            return abandon(tx, DecisionWrite::AlreadyProcessed).await;
        };

        let completed_at = match decision.outcome {
            DecisionOutcome::Rejected => Some(decision.decided_at),
            DecisionOutcome::Approved => None,
        };
        let query = format!(
            "UPDATE requests SET status = $1, updated_at = $2, \
             completed_at = COALESCE($3, completed_at) \
             WHERE id = $4 AND status = $5 AND deleted_at IS NULL RETURNING {}",
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, ProvisionRequest>(&query)
            .bind(decision.outcome.request_status())
            .bind(decision.decided_at)
            .bind(completed_at)
            .bind(request_id)
            .bind(RequestStatus::Pending)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(request) = request else {
            return abandon(tx, DecisionWrite::RequestNotPending).await;
        };

        commit_transaction(tx).await?;
        Ok(DecisionWrite::Applied { approval, request })
    }
}
