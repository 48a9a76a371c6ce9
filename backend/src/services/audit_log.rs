use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    audit_log::{AuditLog, AuditLogListQuery},
    identity::Caller,
};
use crate::repositories::{
    audit_log::{AuditLogFilters, AuditLogRepositoryTrait},
    common::page_bounds,
};
use crate::types::{AuditLogId, UserId};

pub const RESOURCE_REQUEST: &str = "request";
pub const RESOURCE_APPROVAL: &str = "approval";

#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub user_id: Option<UserId>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditLogEntry {
    /// Entry attributed to `caller`, carrying its client address and agent.
    pub fn by(
        caller: &Caller,
        action: impl Into<String>,
        resource_type: &str,
        resource_id: impl Into<Uuid>,
    ) -> Self {
        Self {
            user_id: Some(caller.user_id),
            action: action.into(),
            resource_type: resource_type.to_string(),
            resource_id: Some(resource_id.into()),
            old_values: None,
            new_values: None,
            ip_address: caller.ip_address.clone(),
            user_agent: caller.user_agent.clone(),
        }
    }

    pub fn old<T: Serialize>(mut self, values: &T) -> Self {
        self.old_values = snapshot(values);
        self
    }

    pub fn new_values<T: Serialize>(mut self, values: &T) -> Self {
        self.new_values = snapshot(values);
        self
    }
}

fn snapshot<T: Serialize>(values: &T) -> Option<Value> {
    match serde_json::to_value(values) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to snapshot audit values");
            None
        }
    }
}

/// Append-only audit recorder.
///
/// Recording is best-effort: a failed write is logged and swallowed so the
/// operation that triggered it still succeeds.
#[derive(Clone)]
pub struct AuditLogService {
    repo: Arc<dyn AuditLogRepositoryTrait>,
}

impl AuditLogService {
    pub fn new(repo: Arc<dyn AuditLogRepositoryTrait>) -> Self {
        Self { repo }
    }

    pub async fn record_event(&self, entry: AuditLogEntry) {
        let log = AuditLog {
            id: AuditLogId::new(),
            user_id: entry.user_id,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            old_values: entry.old_values.map(Json),
            new_values: entry.new_values.map(Json),
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: Utc::now(),
        };

        if let Err(err) = self.repo.insert(&log).await {
            tracing::warn!(
                error = %err,
                action = %log.action,
                resource_type = %log.resource_type,
                resource_id = ?log.resource_id,
                "Failed to record audit log"
            );
        }
    }

    pub async fn list(
        &self,
        caller: &Caller,
        query: AuditLogListQuery,
    ) -> Result<Vec<AuditLog>, AppError> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can read audit logs".to_string(),
            ));
        }
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let filters = AuditLogFilters {
            user_id: query.user_id,
            action: query.action,
            resource_type: query.resource_type,
            resource_id: query.resource_id,
            limit,
            offset,
        };
        self.repo.list(&filters).await
    }
}
