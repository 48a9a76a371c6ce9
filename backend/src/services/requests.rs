//! Request lifecycle: creation, edits, submission and withdrawal.
//!
//! Every method takes the caller explicitly. Checks run in a fixed order:
//! existence, then ownership or role, then lifecycle state, then input. Status
//! writes go through the repository's conditional methods, so a request that
//! moved underneath us yields `InvalidState` rather than a lost update.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    approval::DecisionOutcome,
    identity::Caller,
    request::{
        CreateRequestPayload, DeleteOutcome, ProvisionRequest, RequestListQuery, RequestStatus,
        UpdateRequestPayload,
    },
};
use crate::repositories::{
    catalog::CatalogRepositoryTrait,
    common::page_bounds,
    request::{RequestListFilters, RequestRepositoryTrait},
};
use crate::services::{
    approval::ApprovalService,
    audit_log::{AuditLogEntry, AuditLogService, RESOURCE_REQUEST},
    schema::{ensure_object, validate_configuration},
};
use crate::types::RequestId;

const NOT_SUBMITTABLE: &str = "Request must be in draft or planned status";
const NOT_EDITABLE: &str = "Only draft requests can be updated";
const CHANGED_CONCURRENTLY: &str = "Request was modified concurrently";

/// Status a pending request takes when an approver's verdict is mirrored onto it.
///
/// Stale or duplicate decisions on a request that already left `pending` are
/// rejected.
pub fn apply_approval_decision(
    request: &ProvisionRequest,
    outcome: DecisionOutcome,
) -> Result<RequestStatus, AppError> {
    let next = outcome.request_status();
    if !request.status.can_transition_to(next) || request.status != RequestStatus::Pending {
        return Err(AppError::InvalidState(
            "Request is no longer pending".to_string(),
        ));
    }
    Ok(next)
}

#[derive(Clone)]
pub struct RequestService {
    requests: Arc<dyn RequestRepositoryTrait>,
    catalog: Arc<dyn CatalogRepositoryTrait>,
    audit: AuditLogService,
}

impl RequestService {
    pub fn new(
        requests: Arc<dyn RequestRepositoryTrait>,
        catalog: Arc<dyn CatalogRepositoryTrait>,
        audit: AuditLogService,
    ) -> Self {
        Self {
            requests,
            catalog,
            audit,
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        payload: CreateRequestPayload,
    ) -> Result<ProvisionRequest, AppError> {
        let environment = self
            .catalog
            .find_environment(payload.environment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Environment not found".to_string()))?;
        let resource_type = self
            .catalog
            .find_resource_type(payload.resource_type_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Resource type not found".to_string()))?;

        payload.validate()?;
        ensure_object(&payload.configuration)?;
        if !environment.is_active {
            return Err(AppError::validation(
                "environment_id: environment is not active",
            ));
        }
        if !resource_type.is_active {
            return Err(AppError::validation(
                "resource_type_id: resource type is not active",
            ));
        }

        let request = ProvisionRequest::new(
            caller.user_id,
            environment.id,
            resource_type.id,
            payload.title,
            payload.description,
            payload.configuration,
            payload.priority,
        );
        let created = self.requests.insert(&request).await?;

        tracing::info!(
            request_id = %created.id,
            requester_id = %caller.user_id,
            environment = %environment.name,
            resource_type = %resource_type.name,
            "Request created"
        );
        self.audit
            .record_event(
                AuditLogEntry::by(caller, "create", RESOURCE_REQUEST, created.id)
                    .new_values(&created),
            )
            .await;
        Ok(created)
    }

    pub async fn get(&self, caller: &Caller, id: RequestId) -> Result<ProvisionRequest, AppError> {
        let request = self.load(id).await?;
        if !caller.is_reviewer() && !request.is_owned_by(caller.user_id) {
            return Err(AppError::Forbidden(
                "You can only view your own requests".to_string(),
            ));
        }
        Ok(request)
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: RequestId,
        payload: UpdateRequestPayload,
    ) -> Result<ProvisionRequest, AppError> {
        let request = self.load(id).await?;
        if !request.is_owned_by(caller.user_id) {
            return Err(AppError::Forbidden(
                "You can only update your own requests".to_string(),
            ));
        }
        if request.status != RequestStatus::Draft {
            tracing::debug!(request_id = %id, status = %request.status, "Update rejected");
            return Err(AppError::InvalidState(NOT_EDITABLE.to_string()));
        }
        payload.validate()?;
        if let Some(configuration) = payload.configuration.as_ref() {
            ensure_object(configuration)?;
        }

        let mut changed = request.clone();
        changed.apply_update(payload);
        let updated = self
            .requests
            .update_draft(&changed)
            .await?
            .ok_or_else(|| AppError::InvalidState(NOT_EDITABLE.to_string()))?;

        tracing::info!(request_id = %id, "Request updated");
        self.audit
            .record_event(
                AuditLogEntry::by(caller, "update", RESOURCE_REQUEST, id)
                    .old(&request)
                    .new_values(&updated),
            )
            .await;
        Ok(updated)
    }

    /// Moves a draft or planned request to `pending` (environment needs
    /// approval, with a fresh pending approval) or straight to `approved`.
    pub async fn submit(
        &self,
        caller: &Caller,
        id: RequestId,
    ) -> Result<ProvisionRequest, AppError> {
        let request = self.load(id).await?;
        if !request.is_owned_by(caller.user_id) {
            return Err(AppError::Forbidden(
                "You can only submit your own requests".to_string(),
            ));
        }
        if !request.status.is_submittable() {
            tracing::debug!(request_id = %id, status = %request.status, "Submit rejected");
            return Err(AppError::InvalidState(NOT_SUBMITTABLE.to_string()));
        }

        let environment = self
            .catalog
            .find_environment(request.environment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Environment not found".to_string()))?;
        let resource_type = self
            .catalog
            .find_resource_type(request.resource_type_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Resource type not found".to_string()))?;
        validate_configuration(&resource_type.config_schema, &request.configuration)?;

        let (target, approval) = if environment.requires_approval {
            (RequestStatus::Pending, Some(ApprovalService::pending_for(id)))
        } else {
            (RequestStatus::Approved, None)
        };
        let approval_id = approval.as_ref().map(|approval| approval.id);

        let submitted = self
            .requests
            .submit(id, request.status, target, Utc::now(), approval)
            .await?
            .ok_or_else(|| AppError::InvalidState(NOT_SUBMITTABLE.to_string()))?;

        tracing::info!(
            request_id = %id,
            from = %request.status,
            to = %submitted.status,
            approval_id = ?approval_id,
            "Request submitted"
        );
        self.audit
            .record_event(
                AuditLogEntry::by(caller, "submit", RESOURCE_REQUEST, id)
                    .old(&json!({ "status": request.status }))
                    .new_values(&json!({
                        "status": submitted.status,
                        "approval_id": approval_id,
                    })),
            )
            .await;
        Ok(submitted)
    }

    /// Removes a draft or rejected request; cancels anything else.
    pub async fn delete(&self, caller: &Caller, id: RequestId) -> Result<DeleteOutcome, AppError> {
        let request = self.load(id).await?;
        if !request.is_owned_by(caller.user_id) && !caller.is_admin() {
            return Err(AppError::Forbidden(
                "You can only delete your own requests".to_string(),
            ));
        }

        let now = Utc::now();
        if request.status.is_deletable() {
            if !self.requests.soft_delete(id, request.status, now).await? {
                return Err(AppError::InvalidState(CHANGED_CONCURRENTLY.to_string()));
            }
            tracing::info!(request_id = %id, status = %request.status, "Request deleted");
            self.audit
                .record_event(
                    AuditLogEntry::by(caller, "delete", RESOURCE_REQUEST, id).old(&request),
                )
                .await;
            return Ok(DeleteOutcome::Deleted);
        }

        if request.status == RequestStatus::Cancelled {
            return Ok(DeleteOutcome::Cancelled);
        }

        let cancelled = self
            .requests
            .cancel(id, request.status, now)
            .await?
            .ok_or_else(|| AppError::InvalidState(CHANGED_CONCURRENTLY.to_string()))?;

        tracing::info!(request_id = %id, from = %request.status, "Request cancelled");
        self.audit
            .record_event(
                AuditLogEntry::by(caller, "cancel", RESOURCE_REQUEST, id)
                    .old(&json!({ "status": request.status }))
                    .new_values(&json!({ "status": cancelled.status })),
            )
            .await;
        Ok(DeleteOutcome::Cancelled)
    }

    /// Users see their own requests; approvers and admins see everything.
    pub async fn list(
        &self,
        caller: &Caller,
        query: RequestListQuery,
    ) -> Result<Vec<ProvisionRequest>, AppError> {
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let filters = RequestListFilters {
            requester_id: (!caller.is_reviewer()).then_some(caller.user_id),
            status: query.status,
            environment_id: query.environment_id,
            limit,
            offset,
        };
        self.requests.list(&filters).await
    }

    async fn load(&self, id: RequestId) -> Result<ProvisionRequest, AppError> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
    }
}
