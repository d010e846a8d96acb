//! Tenant and branch models
//!
//! A tenant is an isolated customer account; every other entity in the
//! platform is partitioned by tenant id. A branch is a sub-location within a
//! tenant (an individual restaurant outlet).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated customer account. The only entity that is not itself
/// tenant-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A sub-location within a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
