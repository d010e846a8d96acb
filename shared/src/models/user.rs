//! User accounts and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Platform roles, ordered by privilege.
///
/// `Staff` is the lowest-privilege mutating role: it can create records
/// (waste logs, approval requests) but cannot update or delete existing
/// inventory or waste rows directly — those mutations go through the
/// approval workflow and are reviewed by a `Manager` or `Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Manager,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    /// Whether this role may update or delete inventory and waste rows
    /// without going through the approval workflow.
    pub fn can_mutate_directly(&self) -> bool {
        matches!(self, Role::Owner | Role::Manager)
    }

    /// Whether this role may review approval requests.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Owner | Role::Manager)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A user account within a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
