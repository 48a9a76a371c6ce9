//! Provisioning requests and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::types::{EnvironmentId, RequestId, ResourceTypeId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// Lifecycle state of a provisioning request.
pub enum RequestStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Planning,
    Planned,
    Applying,
    Applied,
    Failed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 10] = [
        RequestStatus::Draft,
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Planning,
        RequestStatus::Planned,
        RequestStatus::Applying,
        RequestStatus::Applied,
        RequestStatus::Failed,
        RequestStatus::Cancelled,
    ];

    /// States from which `submit` is legal.
    pub const SUBMITTABLE: [RequestStatus; 2] = [RequestStatus::Draft, RequestStatus::Planned];

    /// States in which a delete removes the record instead of cancelling it.
    pub const DELETABLE: [RequestStatus; 2] = [RequestStatus::Draft, RequestStatus::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Draft => "draft",
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Planning => "planning",
            RequestStatus::Planned => "planned",
            RequestStatus::Applying => "applying",
            RequestStatus::Applied => "applied",
            RequestStatus::Failed => "failed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Explicit transition table. `Planned`, `Planning`, `Applying`, `Applied`
    /// and `Failed` are entered by the out-of-band provisioning pipeline; the
    /// portal itself only drives submit, decision and cancel edges.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        match (self, next) {
            (Draft | Planned, Pending | Approved) => true,
            (Draft, Planned) => true,
            (Pending, Approved | Rejected) => true,
            (Approved, Planning) => true,
            (Planning, Planned | Failed) => true,
            (Planned, Applying) => true,
            (Applying, Applied | Failed) => true,
            (Draft | Rejected | Cancelled, Cancelled) => false,
            (_, Cancelled) => true,
            _ => false,
        }
    }

    pub fn is_submittable(&self) -> bool {
        Self::SUBMITTABLE.contains(self)
    }

    pub fn is_deletable(&self) -> bool {
        Self::DELETABLE.contains(self)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown request status: {}", s))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "request_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
/// A request for infrastructure in one environment.
pub struct ProvisionRequest {
    pub id: RequestId,
    pub title: String,
    pub description: Option<String>,
    pub requester_id: UserId,
    pub environment_id: EnvironmentId,
    pub resource_type_id: ResourceTypeId,
    /// Resource configuration, checked against the resource type schema on submit.
    #[sqlx(json)]
    #[schema(value_type = Object)]
    pub configuration: Value,
    /// Plan output attached by the provisioning pipeline.
    pub terraform_plan: Option<String>,
    pub estimated_cost: f64,
    pub status: RequestStatus,
    pub priority: Priority,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProvisionRequest {
    pub fn new(
        requester_id: UserId,
        environment_id: EnvironmentId,
        resource_type_id: ResourceTypeId,
        title: String,
        description: Option<String>,
        configuration: Value,
        priority: Option<Priority>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            title,
            description,
            requester_id,
            environment_id,
            resource_type_id,
            configuration,
            terraform_plan: None,
            estimated_cost: 0.0,
            status: RequestStatus::Draft,
            priority: priority.unwrap_or_default(),
            submitted_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.requester_id == user_id
    }

    /// Applies the editable fields of an update payload; absent fields keep their value.
    pub fn apply_update(&mut self, payload: UpdateRequestPayload) {
        if let Some(title) = payload.title {
            self.title = title;
        }
        if let Some(description) = payload.description {
            self.description = Some(description);
        }
        if let Some(configuration) = payload.configuration {
            self.configuration = configuration;
        }
        if let Some(priority) = payload.priority {
            self.priority = priority;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRequestPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub environment_id: EnvironmentId,
    pub resource_type_id: ResourceTypeId,
    #[schema(value_type = Object)]
    pub configuration: Value,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRequestPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub configuration: Option<Value>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RequestListQuery {
    pub status: Option<RequestStatus>,
    pub environment_id: Option<EnvironmentId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// What a delete did to the request.
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteRequestResponse {
    pub id: RequestId,
    pub outcome: DeleteOutcome,
    pub message: String,
}

impl DeleteRequestResponse {
    pub fn new(id: RequestId, outcome: DeleteOutcome) -> Self {
        let message = match outcome {
            DeleteOutcome::Deleted => "Request deleted",
            DeleteOutcome::Cancelled => "Request cancelled",
        };
        Self {
            id,
            outcome,
            message: message.to_string(),
        }
    }
}
