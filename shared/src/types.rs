//! Common types used across the platform

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::Role;

/// Error raised when an operation is missing its tenant or branch scope.
///
/// A missing scope is a programming error in the caller, not a recoverable
/// user error, and must abort the operation before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("operation requires a tenant scope")]
    MissingTenant,

    #[error("operation requires a branch scope")]
    MissingBranch,
}

/// Tenant scope threaded explicitly through every data-access call.
///
/// There is no ambient "current tenant" state anywhere in the platform; a
/// service method that touches tenant-scoped rows takes a `TenantContext`
/// parameter, so the scoping invariant is enforced by the signatures rather
/// than by a runtime hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    tenant_id: Uuid,
    branch_id: Option<Uuid>,
    role: Role,
}

impl TenantContext {
    /// Build a context from verified auth claims. Rejects a nil tenant id.
    pub fn new(tenant_id: Uuid, branch_id: Option<Uuid>, role: Role) -> Result<Self, ScopeError> {
        if tenant_id.is_nil() {
            return Err(ScopeError::MissingTenant);
        }
        Ok(Self {
            tenant_id,
            branch_id: branch_id.filter(|b| !b.is_nil()),
            role,
        })
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    /// Branch id for branch-scoped operations. Callers that operate on
    /// branch-scoped entities must go through this accessor.
    pub fn branch_id(&self) -> Result<Uuid, ScopeError> {
        self.branch_id.ok_or(ScopeError::MissingBranch)
    }

    /// Branch id when the operation accepts an optional branch filter.
    pub fn branch_id_opt(&self) -> Option<Uuid> {
        self.branch_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Round a monetary amount to currency minor units (two decimal places).
///
/// Internal cost arithmetic stays at full `Decimal` precision; rounding
/// happens only at the persistence/display boundary.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
