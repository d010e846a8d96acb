//! Tenant guard tests
//!
//! The `TenantContext` is the only route to tenant-scoped data: it cannot be
//! constructed without a real tenant id, and branch-scoped operations fail
//! before any side effect when the branch is missing.

use uuid::Uuid;

use shared::models::Role;
use shared::types::{ScopeError, TenantContext};

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_nil_tenant_rejected() {
        let result = TenantContext::new(Uuid::nil(), None, Role::Owner);
        assert_eq!(result.unwrap_err(), ScopeError::MissingTenant);
    }

    #[test]
    fn test_branch_scope_is_fallible() {
        let ctx = TenantContext::new(Uuid::from_u128(1), None, Role::Staff).unwrap();

        assert_eq!(ctx.branch_id().unwrap_err(), ScopeError::MissingBranch);
        assert!(ctx.branch_id_opt().is_none());
    }

    #[test]
    fn test_scoped_context_exposes_ids() {
        let tenant = Uuid::from_u128(1);
        let branch = Uuid::from_u128(2);
        let ctx = TenantContext::new(tenant, Some(branch), Role::Manager).unwrap();

        assert_eq!(ctx.tenant_id(), tenant);
        assert_eq!(ctx.branch_id().unwrap(), branch);
        assert_eq!(ctx.role(), Role::Manager);
    }

    /// A nil branch claim is treated as no branch, not as a valid scope.
    #[test]
    fn test_nil_branch_treated_as_absent() {
        let ctx = TenantContext::new(Uuid::from_u128(1), Some(Uuid::nil()), Role::Staff).unwrap();

        assert_eq!(ctx.branch_id().unwrap_err(), ScopeError::MissingBranch);
    }

    /// Staff is the only role routed through the approval workflow.
    #[test]
    fn test_role_privileges() {
        assert!(Role::Owner.can_mutate_directly());
        assert!(Role::Manager.can_mutate_directly());
        assert!(!Role::Staff.can_mutate_directly());

        assert!(Role::Owner.can_review());
        assert!(Role::Manager.can_review());
        assert!(!Role::Staff.can_review());
    }
}
