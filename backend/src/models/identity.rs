//! Caller identity as established by the authentication layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Portal roles. Approvers and admins decide approvals; admins may also
/// withdraw anybody's request.
pub enum UserRole {
    #[default]
    User,
    Approver,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Approver => "approver",
            UserRole::Admin => "admin",
        }
    }

    /// Roles allowed to decide approvals and read every request.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, UserRole::Approver | UserRole::Admin)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "approver" => Ok(UserRole::Approver),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Authenticated `(user_id, role)` pair attached to each request by the auth middleware.
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

/// Identity plus client metadata, passed explicitly into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: UserRole,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Caller {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn from_identity(identity: Identity) -> Self {
        Self::new(identity.user_id, identity.role)
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    pub fn is_reviewer(&self) -> bool {
        self.role.is_reviewer()
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_tolerates_case() {
        assert_eq!("ADMIN".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("approver".parse::<UserRole>(), Ok(UserRole::Approver));
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_approvers_and_admins_review() {
        assert!(!UserRole::User.is_reviewer());
        assert!(UserRole::Approver.is_reviewer());
        assert!(UserRole::Admin.is_reviewer());
    }

    #[test]
    fn role_serializes_snake_case() {
        let value = serde_json::to_value(UserRole::Approver).unwrap();
        assert_eq!(value, serde_json::json!("approver"));
    }
}
