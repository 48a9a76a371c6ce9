//! Approval records spawned when a request enters `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::request::RequestStatus;
use crate::types::{ApprovalId, RequestId, UserId};

/// Comment written onto an approval that was closed because its request was cancelled.
pub const CANCELLED_APPROVAL_COMMENT: &str = "request cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("unknown approval status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Verdict an approver can hand down.
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

impl DecisionOutcome {
    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            DecisionOutcome::Approved => ApprovalStatus::Approved,
            DecisionOutcome::Rejected => ApprovalStatus::Rejected,
        }
    }

    /// Status the parent request takes when this verdict is mirrored onto it.
    pub fn request_status(&self) -> RequestStatus {
        match self {
            DecisionOutcome::Approved => RequestStatus::Approved,
            DecisionOutcome::Rejected => RequestStatus::Rejected,
        }
    }

    /// Audit action name.
    pub fn action(&self) -> &'static str {
        match self {
            DecisionOutcome::Approved => "approve",
            DecisionOutcome::Rejected => "reject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Approval {
    pub id: ApprovalId,
    pub request_id: RequestId,
    /// Deciding user; `None` while pending or when closed by a cancellation.
    pub approver_id: Option<UserId>,
    pub status: ApprovalStatus,
    pub comment: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Approval {
    pub fn pending(request_id: RequestId) -> Self {
        Self {
            id: ApprovalId::new(),
            request_id,
            approver_id: None,
            status: ApprovalStatus::Pending,
            comment: None,
            approved_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, ApprovalStatus::Pending)
    }

    /// Records a verdict. Callers must have checked `is_pending` under the same lock.
    pub fn decide(&mut self, decision: &ApprovalDecision) {
        self.status = decision.outcome.approval_status();
        self.approver_id = Some(decision.approver_id);
        self.comment = decision.comment.clone();
        self.approved_at = Some(decision.decided_at);
    }

    /// Closes a pending approval whose request was withdrawn.
    pub fn close_for_cancellation(&mut self, at: DateTime<Utc>) {
        self.status = ApprovalStatus::Rejected;
        self.comment = Some(CANCELLED_APPROVAL_COMMENT.to_string());
        self.approved_at = Some(at);
    }
}

/// A verdict ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalDecision {
    pub outcome: DecisionOutcome,
    pub approver_id: UserId,
    pub comment: Option<String>,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct DecisionPayload {
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ApprovalListQuery {
    /// `pending` (default), `approved`, `rejected` or `all`.
    pub status: Option<String>,
    pub request_id: Option<RequestId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
