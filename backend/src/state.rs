use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    repositories::{
        ApprovalRepositoryTrait, AuditLogRepositoryTrait, CatalogRepositoryTrait, InMemoryStore,
        PgApprovalRepository, PgAuditLogRepository, PgCatalogRepository, PgRequestRepository,
        RequestRepositoryTrait,
    },
    services::{ApprovalService, AuditLogService, CatalogService, RequestService},
};

/// One implementation per repository seam.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepositoryTrait>,
    pub requests: Arc<dyn RequestRepositoryTrait>,
    pub approvals: Arc<dyn ApprovalRepositoryTrait>,
    pub audit_logs: Arc<dyn AuditLogRepositoryTrait>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
            requests: Arc::new(PgRequestRepository::new(pool.clone())),
            approvals: Arc::new(PgApprovalRepository::new(pool.clone())),
            audit_logs: Arc::new(PgAuditLogRepository::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            catalog: Arc::new(store.clone()),
            requests: Arc::new(store.clone()),
            approvals: Arc::new(store.clone()),
            audit_logs: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogService,
    pub requests: RequestService,
    pub approvals: ApprovalService,
    pub audit_logs: AuditLogService,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories) -> Self {
        let audit_logs = AuditLogService::new(repos.audit_logs);
        Self {
            catalog: CatalogService::new(repos.catalog.clone()),
            requests: RequestService::new(
                repos.requests.clone(),
                repos.catalog,
                audit_logs.clone(),
            ),
            approvals: ApprovalService::new(repos.approvals, repos.requests, audit_logs.clone()),
            audit_logs,
            config,
        }
    }
}
