pub mod approvals;
pub mod audit_logs;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod requests;
