use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::audit_log::AuditLog;
use crate::repositories::common::{push_clause, DEFAULT_PAGE_SIZE};
use crate::types::UserId;

const AUDIT_LOG_COLUMNS: &str = "id, user_id, action, resource_type, resource_id, old_values, \
     new_values, ip_address, user_agent, created_at";

#[derive(Debug, Clone)]
pub struct AuditLogFilters {
    pub user_id: Option<UserId>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditLogFilters {
    fn default() -> Self {
        Self {
            user_id: None,
            action: None,
            resource_type: None,
            resource_id: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Append-only audit storage. There is no update or delete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogRepositoryTrait: Send + Sync {
    async fn insert(&self, log: &AuditLog) -> Result<(), AppError>;

    async fn list(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepositoryTrait for PgAuditLogRepository {
    async fn insert(&self, log: &AuditLog) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO audit_logs \
             (id, user_id, action, resource_type, resource_id, old_values, new_values, \
             ip_address, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(log.id)
        .bind(log.user_id)
        .bind(&log.action)
        .bind(&log.resource_type)
        .bind(log.resource_id)
        .bind(&log.old_values)
        .bind(&log.new_values)
        .bind(&log.ip_address)
        .bind(&log.user_agent)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM audit_logs", AUDIT_LOG_COLUMNS));
        let mut has_clause = false;
        apply_audit_log_filters(&mut builder, &mut has_clause, filters);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filters.limit)
            .push(" OFFSET ")
            .push_bind(filters.offset);

        let rows = builder
            .build_query_as::<AuditLog>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn apply_audit_log_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &AuditLogFilters,
) {
    if let Some(user_id) = filters.user_id {
        push_clause(builder, has_clause);
        builder.push("user_id = ").push_bind(user_id);
    }
    if let Some(action) = filters.action.as_ref() {
        push_clause(builder, has_clause);
        builder.push("action = ").push_bind(action.clone());
    }
    if let Some(resource_type) = filters.resource_type.as_ref() {
        push_clause(builder, has_clause);
        builder
            .push("resource_type = ")
            .push_bind(resource_type.clone());
    }
    if let Some(resource_id) = filters.resource_id {
        push_clause(builder, has_clause);
        builder.push("resource_id = ").push_bind(resource_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_render_in_declaration_order() {
        let filters = AuditLogFilters {
            user_id: Some(UserId::new()),
            action: Some("approve".into()),
            resource_type: None,
            resource_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM audit_logs");
        let mut has_clause = false;
        apply_audit_log_filters(&mut builder, &mut has_clause, &filters);
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM audit_logs WHERE user_id = $1 AND action = $2 AND resource_id = $3"
        );
    }

    #[test]
    fn no_filters_no_where() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM audit_logs");
        let mut has_clause = false;
        apply_audit_log_filters(&mut builder, &mut has_clause, &AuditLogFilters::default());
        assert_eq!(builder.sql(), "SELECT 1 FROM audit_logs");
        assert!(!has_clause);
    }
}
