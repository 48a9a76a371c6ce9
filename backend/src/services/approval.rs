use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    approval::{
        Approval, ApprovalDecision, ApprovalListQuery, ApprovalStatus, DecisionOutcome,
        DecisionPayload,
    },
    identity::Caller,
};
use crate::repositories::{
    approval::{ApprovalListFilters, ApprovalRepositoryTrait, DecisionWrite},
    common::page_bounds,
    request::RequestRepositoryTrait,
};
use crate::services::{
    audit_log::{AuditLogEntry, AuditLogService, RESOURCE_APPROVAL},
    requests::apply_approval_decision,
};
use crate::types::{ApprovalId, RequestId};

const ALREADY_PROCESSED: &str = "Approval already processed";

/// Approver-facing side of the workflow.
#[derive(Clone)]
pub struct ApprovalService {
    approvals: Arc<dyn ApprovalRepositoryTrait>,
    requests: Arc<dyn RequestRepositoryTrait>,
    audit: AuditLogService,
}

impl ApprovalService {
    pub fn new(
        approvals: Arc<dyn ApprovalRepositoryTrait>,
        requests: Arc<dyn RequestRepositoryTrait>,
        audit: AuditLogService,
    ) -> Self {
        Self {
            approvals,
            requests,
            audit,
        }
    }

    /// A new pending approval for `request_id`, persisted by the caller in the
    /// same unit as the request's move to `pending`.
    pub fn pending_for(request_id: RequestId) -> Approval {
        Approval::pending(request_id)
    }

    pub async fn get(&self, caller: &Caller, id: ApprovalId) -> Result<Approval, AppError> {
        ensure_reviewer(caller, "Only approvers can view approvals")?;
        self.approvals
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Approval not found".to_string()))
    }

    /// Lists approvals. A missing status filter means `pending`; `all` lists
    /// every status.
    pub async fn list(
        &self,
        caller: &Caller,
        query: ApprovalListQuery,
    ) -> Result<Vec<Approval>, AppError> {
        ensure_reviewer(caller, "Only approvers can list approvals")?;
        let status = match query.status.as_deref() {
            None | Some("") => Some(ApprovalStatus::Pending),
            Some("all") => None,
            Some(other) => Some(other.parse::<ApprovalStatus>().map_err(AppError::BadRequest)?),
        };
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let filters = ApprovalListFilters {
            status,
            request_id: query.request_id,
            limit,
            offset,
        };
        self.approvals.list(&filters).await
    }

    /// Records a verdict and mirrors it onto the parent request atomically.
    pub async fn decide(
        &self,
        caller: &Caller,
        id: ApprovalId,
        outcome: DecisionOutcome,
        payload: DecisionPayload,
    ) -> Result<Approval, AppError> {
        ensure_reviewer(caller, "Only approvers can decide approvals")?;
        let approval = self
            .approvals
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Approval not found".to_string()))?;
        if !approval.is_pending() {
            tracing::debug!(
                approval_id = %id,
                status = approval.status.as_str(),
                "Decision rejected"
            );
            return Err(AppError::InvalidState(ALREADY_PROCESSED.to_string()));
        }
        let request = self
            .requests
            .find_by_id(approval.request_id)
            .await?
            .ok_or_else(|| AppError::InvalidState("Request is no longer pending".to_string()))?;
        let expected = apply_approval_decision(&request, outcome)?;
        payload.validate()?;

        let decision = ApprovalDecision {
            outcome,
            approver_id: caller.user_id,
            comment: payload.comment,
            decided_at: Utc::now(),
        };
        let (decided, request) = match self.approvals.decide(id, &decision).await? {
            DecisionWrite::Applied { approval, request } => (approval, request),
            DecisionWrite::NotFound => {
                return Err(AppError::NotFound("Approval not found".to_string()))
            }
            DecisionWrite::AlreadyProcessed => {
                tracing::debug!(approval_id = %id, "Lost decision race");
                return Err(AppError::InvalidState(ALREADY_PROCESSED.to_string()));
            }
            DecisionWrite::RequestNotPending => {
                return Err(AppError::InvalidState(
                    "Request is no longer pending".to_string(),
                ))
            }
        };
        if request.status != expected {
            return Err(AppError::internal(format!(
                "request {} mirrored as {} instead of {}",
                request.id, request.status, expected
            )));
        }

        tracing::info!(
            approval_id = %id,
            request_id = %request.id,
            approver_id = %caller.user_id,
            outcome = outcome.action(),
            "Approval decided"
        );
        self.audit
            .record_event(
                AuditLogEntry::by(caller, outcome.action(), RESOURCE_APPROVAL, id)
                    .old(&json!({ "status": ApprovalStatus::Pending }))
                    .new_values(&json!({
                        "status": decided.status,
                        "comment": decided.comment,
                        "request_id": request.id,
                        "request_status": request.status,
                    })),
            )
            .await;
        Ok(decided)
    }
}

fn ensure_reviewer(caller: &Caller, message: &str) -> Result<(), AppError> {
    if caller.is_reviewer() {
        Ok(())
    } else {
        Err(AppError::Forbidden(message.to_string()))
    }
}
