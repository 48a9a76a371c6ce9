//! In-process store implementing every repository trait.
//!
//! All state sits behind one `std::sync::Mutex`. Each trait method takes the
//! lock once, performs its check-and-write, and releases it without awaiting,
//! which gives the same at-most-one-winner behaviour as the conditional
//! updates of the PostgreSQL repositories.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::seed::{default_environments, default_resource_types};
use crate::error::AppError;
use crate::models::{
    approval::{Approval, ApprovalDecision, ApprovalStatus, DecisionOutcome},
    audit_log::AuditLog,
    catalog::{Environment, ResourceType},
    request::{ProvisionRequest, RequestStatus},
};
use crate::repositories::{
    approval::{ApprovalListFilters, ApprovalRepositoryTrait, DecisionWrite},
    audit_log::{AuditLogFilters, AuditLogRepositoryTrait},
    catalog::CatalogRepositoryTrait,
    request::{RequestListFilters, RequestRepositoryTrait},
};
use crate::types::{ApprovalId, EnvironmentId, RequestId, ResourceTypeId};

#[derive(Debug, Default)]
struct MemoryState {
    environments: Vec<Environment>,
    resource_types: Vec<ResourceType>,
    requests: HashMap<RequestId, ProvisionRequest>,
    approvals: HashMap<ApprovalId, Approval>,
    audit_logs: Vec<AuditLog>,
}

impl MemoryState {
    fn live_request_mut(&mut self, id: RequestId) -> Option<&mut ProvisionRequest> {
        self.requests
            .get_mut(&id)
            .filter(|request| request.deleted_at.is_none())
    }

    fn has_pending_approval(&self, request_id: RequestId) -> bool {
        self.approvals
            .values()
            .any(|approval| approval.request_id == request_id && approval.is_pending())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the dev/staging/prod environments and the
    /// gke/cloudsql/redis resource types.
    pub fn with_default_catalog() -> Self {
        Self::with_catalog(default_environments(), default_resource_types())
    }

    pub fn with_catalog(
        environments: Vec<Environment>,
        resource_types: Vec<ResourceType>,
    ) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.environments = environments;
            state.resource_types = resource_types;
        }
        store
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("in-memory store lock poisoned"))
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, uuid::Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

fn matches_key(id: uuid::Uuid, name: &str, key: &str) -> bool {
    name == key || id.to_string() == key
}

#[async_trait]
impl CatalogRepositoryTrait for InMemoryStore {
    async fn find_environment(&self, id: EnvironmentId) -> Result<Option<Environment>, AppError> {
        let state = self.state()?;
        Ok(state.environments.iter().find(|env| env.id == id).cloned())
    }

    async fn find_environment_by_key(&self, key: &str) -> Result<Option<Environment>, AppError> {
        let state = self.state()?;
        Ok(state
            .environments
            .iter()
            .find(|env| matches_key(env.id.as_uuid().to_owned(), &env.name, key))
            .cloned())
    }

    async fn list_environments(&self) -> Result<Vec<Environment>, AppError> {
        let state = self.state()?;
        let mut items: Vec<Environment> = state
            .environments
            .iter()
            .filter(|env| env.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_resource_type(
        &self,
        id: ResourceTypeId,
    ) -> Result<Option<ResourceType>, AppError> {
        let state = self.state()?;
        Ok(state.resource_types.iter().find(|rt| rt.id == id).cloned())
    }

    async fn find_resource_type_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ResourceType>, AppError> {
        let state = self.state()?;
        Ok(state
            .resource_types
            .iter()
            .find(|rt| matches_key(rt.id.as_uuid().to_owned(), &rt.name, key))
            .cloned())
    }

    async fn list_resource_types(&self) -> Result<Vec<ResourceType>, AppError> {
        let state = self.state()?;
        let mut items: Vec<ResourceType> = state
            .resource_types
            .iter()
            .filter(|rt| rt.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

#[async_trait]
impl RequestRepositoryTrait for InMemoryStore {
    async fn insert(&self, item: &ProvisionRequest) -> Result<ProvisionRequest, AppError> {
        let mut state = self.state()?;
        if state.requests.contains_key(&item.id) {
            return Err(AppError::internal(format!(
                "request {} already exists",
                item.id
            )));
        }
        state.requests.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<ProvisionRequest>, AppError> {
        let state = self.state()?;
        Ok(state
            .requests
            .get(&id)
            .filter(|request| request.deleted_at.is_none())
            .cloned())
    }

    async fn list(&self, filters: &RequestListFilters) -> Result<Vec<ProvisionRequest>, AppError> {
        let state = self.state()?;
        let mut items: Vec<ProvisionRequest> = state
            .requests
            .values()
            .filter(|request| request.deleted_at.is_none())
            .filter(|request| {
                filters
                    .requester_id
                    .map_or(true, |id| request.requester_id == id)
            })
            .filter(|request| filters.status.map_or(true, |s| request.status == s))
            .filter(|request| {
                filters
                    .environment_id
                    .map_or(true, |id| request.environment_id == id)
            })
            .cloned()
            .collect();
        newest_first(&mut items, |r| (r.created_at, r.id.as_uuid().to_owned()));
        Ok(page(items, filters.limit, filters.offset))
    }

    async fn update_draft(
        &self,
        item: &ProvisionRequest,
    ) -> Result<Option<ProvisionRequest>, AppError> {
        let mut state = self.state()?;
        let Some(stored) = state.live_request_mut(item.id) else {
            return Ok(None);
        };
        if stored.status != RequestStatus::Draft {
            return Ok(None);
        }
        stored.title = item.title.clone();
        stored.description = item.description.clone();
        stored.configuration = item.configuration.clone();
        stored.priority = item.priority;
        stored.updated_at = item.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn submit(
        &self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
        approval: Option<Approval>,
    ) -> Result<Option<ProvisionRequest>, AppError> {
        let mut state = self.state()?;
        match state.live_request_mut(id) {
            Some(stored) if stored.status == from => {}
            _ => return Ok(None),
        }
        if let Some(approval) = approval.as_ref() {
            if state.has_pending_approval(id) {
                return Err(AppError::internal(format!(
                    "request {} already has a pending approval",
                    id
                )));
            }
            state.approvals.insert(approval.id, approval.clone());
        }
        let Some(stored) = state.live_request_mut(id) else {
            return Ok(None);
        };
        stored.status = to;
        stored.submitted_at = Some(at);
        stored.updated_at = at;
        Ok(Some(stored.clone()))
    }

    async fn cancel(
        &self,
        id: RequestId,
        from: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ProvisionRequest>, AppError> {
        let mut state = self.state()?;
        let updated = match state.live_request_mut(id) {
            Some(stored) if stored.status == from => {
                stored.status = RequestStatus::Cancelled;
                stored.completed_at = Some(at);
                stored.updated_at = at;
                stored.clone()
            }
            _ => return Ok(None),
        };
        for approval in state.approvals.values_mut() {
            if approval.request_id == id && approval.is_pending() {
                approval.close_for_cancellation(at);
            }
        }
        Ok(Some(updated))
    }

    async fn soft_delete(
        &self,
        id: RequestId,
        from: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut state = self.state()?;
        match state.live_request_mut(id) {
            Some(stored) if stored.status == from => {
                stored.deleted_at = Some(at);
                stored.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ApprovalRepositoryTrait for InMemoryStore {
    async fn find_by_id(&self, id: ApprovalId) -> Result<Option<Approval>, AppError> {
        let state = self.state()?;
        Ok(state.approvals.get(&id).cloned())
    }

    async fn find_pending_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<Approval>, AppError> {
        let state = self.state()?;
        Ok(state
            .approvals
            .values()
            .find(|approval| approval.request_id == request_id && approval.is_pending())
            .cloned())
    }

    async fn list(&self, filters: &ApprovalListFilters) -> Result<Vec<Approval>, AppError> {
        let state = self.state()?;
        let mut items: Vec<Approval> = state
            .approvals
            .values()
            .filter(|approval| filters.status.map_or(true, |s| approval.status == s))
            .filter(|approval| {
                filters
                    .request_id
                    .map_or(true, |id| approval.request_id == id)
            })
            .cloned()
            .collect();
        newest_first(&mut items, |a| (a.created_at, a.id.as_uuid().to_owned()));
        Ok(page(items, filters.limit, filters.offset))
    }

    async fn decide(
        &self,
        id: ApprovalId,
        decision: &ApprovalDecision,
    ) -> Result<DecisionWrite, AppError> {
        let mut state = self.state()?;
        let Some(approval) = state.approvals.get(&id) else {
            return Ok(DecisionWrite::NotFound);
        };
        if approval.status != ApprovalStatus::Pending {
            return Ok(DecisionWrite::AlreadyProcessed);
        }
        let request_id = approval.request_id;

        let request = match state.live_request_mut(request_id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = decision.outcome.request_status();
                request.updated_at = decision.decided_at;
                if decision.outcome == DecisionOutcome::Rejected {
                    request.completed_at = Some(decision.decided_at);
                }
                request.clone()
            }
            _ => return Ok(DecisionWrite::RequestNotPending),
        };

        let Some(approval) = state.approvals.get_mut(&id) else {
            return Ok(DecisionWrite::NotFound);
        };
        approval.decide(decision);
        Ok(DecisionWrite::Applied {
            approval: approval.clone(),
            request,
        })
    }
}

#[async_trait]
impl AuditLogRepositoryTrait for InMemoryStore {
    async fn insert(&self, log: &AuditLog) -> Result<(), AppError> {
        let mut state = self.state()?;
        state.audit_logs.push(log.clone());
        Ok(())
    }

    async fn list(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError> {
        let state = self.state()?;
        let mut items: Vec<AuditLog> = state
            .audit_logs
            .iter()
            .filter(|log| filters.user_id.map_or(true, |id| log.user_id == Some(id)))
            .filter(|log| {
                filters
                    .action
                    .as_deref()
                    .map_or(true, |action| log.action == action)
            })
            .filter(|log| {
                filters
                    .resource_type
                    .as_deref()
                    .map_or(true, |rt| log.resource_type == rt)
            })
            .filter(|log| {
                filters
                    .resource_id
                    .map_or(true, |id| log.resource_id == Some(id))
            })
            .cloned()
            .collect();
        newest_first(&mut items, |log| (log.created_at, log.id.as_uuid().to_owned()));
        Ok(page(items, filters.limit, filters.offset))
    }
}
