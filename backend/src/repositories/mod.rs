pub mod approval;
pub mod audit_log;
pub mod catalog;
pub mod common;
pub mod memory;
pub mod request;
pub mod transaction;

pub use approval::{
    ApprovalListFilters, ApprovalRepositoryTrait, DecisionWrite, PgApprovalRepository,
};
pub use audit_log::{AuditLogFilters, AuditLogRepositoryTrait, PgAuditLogRepository};
pub use catalog::{CatalogRepositoryTrait, PgCatalogRepository};
pub use common::*;
pub use memory::InMemoryStore;
pub use request::{PgRequestRepository, RequestListFilters, RequestRepositoryTrait};
pub use transaction::*;
