use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::{
    approval::{Approval, CANCELLED_APPROVAL_COMMENT},
    request::{ProvisionRequest, RequestStatus},
};
use crate::repositories::{
    approval::insert_pending_approval,
    transaction::{abandon, begin_transaction, commit_transaction},
};
use crate::types::{EnvironmentId, RequestId, UserId};

pub(crate) const REQUEST_COLUMNS: &str = "id, title, description, requester_id, environment_id, \
     resource_type_id, configuration, terraform_plan, estimated_cost, status, priority, \
     submitted_at, completed_at, created_at, updated_at, deleted_at";

/// Filters for querying request lists.
///
/// Soft-deleted requests are never returned, whatever the filters.
#[derive(Debug, Clone)]
pub struct RequestListFilters {
    /// Restrict to one requester (always set for callers with the `user` role)
    pub requester_id: Option<UserId>,
    /// Filter by lifecycle status
    pub status: Option<RequestStatus>,
    /// Filter by target environment
    pub environment_id: Option<EnvironmentId>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for RequestListFilters {
    fn default() -> Self {
        Self {
            requester_id: None,
            status: None,
            environment_id: None,
            limit: crate::repositories::common::DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Persistence for provisioning requests.
///
/// Every status-changing method is a compare-and-swap on the status the
/// caller observed: it returns `None`/`false` when the stored status no longer
/// matches, so at most one of several concurrent transitions wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRepositoryTrait: Send + Sync {
    /// Persist a freshly created request
    async fn insert(&self, item: &ProvisionRequest) -> Result<ProvisionRequest, AppError>;

    /// Find a live (not deleted) request by ID
    async fn find_by_id(&self, id: RequestId) -> Result<Option<ProvisionRequest>, AppError>;

    /// List live requests, newest first
    async fn list(&self, filters: &RequestListFilters) -> Result<Vec<ProvisionRequest>, AppError>;

    /// Write editable fields, only while the request is still a draft
    async fn update_draft(
        &self,
        item: &ProvisionRequest,
    ) -> Result<Option<ProvisionRequest>, AppError>;

    /// Move `from -> to`, stamp `submitted_at`, and insert `approval` in the same unit
    async fn submit(
        &self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
        approval: Option<Approval>,
    ) -> Result<Option<ProvisionRequest>, AppError>;

    /// Move `from -> cancelled`, closing any pending approval in the same unit
    async fn cancel(
        &self,
        id: RequestId,
        from: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ProvisionRequest>, AppError>;

    /// Mark a request deleted if it is still in `from`
    async fn soft_delete(
        &self,
        id: RequestId,
        from: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}

/// PostgreSQL implementation of [`RequestRepositoryTrait`].
#[derive(Debug, Clone)]
pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepositoryTrait for PgRequestRepository {
    async fn insert(&self, item: &ProvisionRequest) -> Result<ProvisionRequest, AppError> {
        let query = format!(
            "INSERT INTO requests ({cols}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {cols}",
            cols = REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, ProvisionRequest>(&query)
            .bind(item.id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.requester_id)
            .bind(item.environment_id)
            .bind(item.resource_type_id)
            .bind(Json(&item.configuration))
            .bind(&item.terraform_plan)
            .bind(item.estimated_cost)
            .bind(item.status)
            .bind(item.priority)
            .bind(item.submitted_at)
            .bind(item.completed_at)
            .bind(item.created_at)
            .bind(item.updated_at)
            .bind(item.deleted_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<ProvisionRequest>, AppError> {
        let query = format!(
            "SELECT {} FROM requests WHERE id = $1 AND deleted_at IS NULL",
            REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, ProvisionRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list(&self, filters: &RequestListFilters) -> Result<Vec<ProvisionRequest>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM requests WHERE deleted_at IS NULL",
            REQUEST_COLUMNS
        ));
        if let Some(requester_id) = filters.requester_id {
            builder.push(" AND requester_id = ").push_bind(requester_id);
        }
        if let Some(status) = filters.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(environment_id) = filters.environment_id {
            builder
                .push(" AND environment_id = ")
                .push_bind(environment_id);
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filters.limit)
            .push(" OFFSET ")
            .push_bind(filters.offset);

        let rows = builder
            .build_query_as::<ProvisionRequest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_draft(
        &self,
        item: &ProvisionRequest,
    ) -> Result<Option<ProvisionRequest>, AppError> {
        let query = format!(
            "UPDATE requests SET title = $2, description = $3, configuration = $4, priority = $5, \
             updated_at = $6 WHERE id = $1 AND status = 'draft' AND deleted_at IS NULL \
             RETURNING {}",
            REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, ProvisionRequest>(&query)
            .bind(item.id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(Json(&item.configuration))
            .bind(item.priority)
            .bind(item.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn submit(
        &self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
        approval: Option<Approval>,
    ) -> Result<Option<ProvisionRequest>, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!(
            "UPDATE requests SET status = $1, submitted_at = $2, updated_at = $2 \
             WHERE id = $3 AND status = $4 AND deleted_at IS NULL RETURNING {}",
            REQUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, ProvisionRequest>(&query)
            .bind(to)
            .bind(at)
            .bind(id)
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            return abandon(tx, None).await;
        };

        if let Some(approval) = approval {
            insert_pending_approval(&mut tx, &approval).await?;
        }

        commit_transaction(tx).await?;
        Ok(Some(updated))
    }

    async fn cancel(
        &self,
        id: RequestId,
        from: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ProvisionRequest>, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!(
            "UPDATE requests SET status = 'cancelled', completed_at = $1, updated_at = $1 \
             WHERE id = $2 AND status = $3 AND deleted_at IS NULL RETURNING {}",
            REQUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, ProvisionRequest>(&query)
            .bind(at)
            .bind(id)
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            return abandon(tx, None).await;
        };

        sqlx::query(
            "UPDATE approvals SET status = 'rejected', comment = $1, approved_at = $2 \
             WHERE request_id = $3 AND status = 'pending'",
        )
        .bind(CANCELLED_APPROVAL_COMMENT)
        .bind(at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        commit_transaction(tx).await?;
        Ok(Some(updated))
    }

    async fn soft_delete(
        &self,
        id: RequestId,
        from: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE requests SET deleted_at = $1, updated_at = $1 \
             WHERE id = $2 AND status = $3 AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_request_repository_trait_bounds() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockRequestRepositoryTrait>();
    }

    #[test]
    fn default_filters_are_unscoped_first_page() {
        let filters = RequestListFilters::default();
        assert!(filters.requester_id.is_none());
        assert!(filters.status.is_none());
        assert!(filters.environment_id.is_none());
        assert_eq!(filters.offset, 0);
        assert!(filters.limit > 0);
    }
}
