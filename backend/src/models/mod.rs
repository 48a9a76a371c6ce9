pub mod approval;
pub mod audit_log;
pub mod catalog;
pub mod identity;
pub mod request;
