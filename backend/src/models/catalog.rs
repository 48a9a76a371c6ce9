//! Read-mostly catalog entries: environments and resource types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{EnvironmentId, ResourceTypeId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Deployment target with its approval policy.
pub struct Environment {
    pub id: EnvironmentId,
    /// Short unique key such as `dev`, `staging` or `prod`.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub gcp_project_id: Option<String>,
    pub region: String,
    /// Submissions into this environment wait for an approver.
    pub requires_approval: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Kind of infrastructure that can be requested, with its configuration schema.
pub struct ResourceType {
    pub id: ResourceTypeId,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub module_path: String,
    /// JSON Schema every request configuration must satisfy before submission.
    #[sqlx(json)]
    #[schema(value_type = Object)]
    pub config_schema: Value,
    pub base_cost: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
