pub mod approval;
pub mod audit_log;
pub mod catalog;
pub mod requests;
pub mod schema;

pub use approval::ApprovalService;
pub use audit_log::{AuditLogEntry, AuditLogService};
pub use catalog::CatalogService;
pub use requests::RequestService;
