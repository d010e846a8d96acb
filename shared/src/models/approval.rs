//! Approval workflow models and state machine
//!
//! An approval request gates a branch-level mutation submitted by a staff
//! actor behind review by a manager or owner. The proposed change is captured
//! as a snapshot at submission time, modeled as a tagged union keyed by the
//! target entity type — each variant carries only the fields legally
//! updatable for that entity, validated at submission, applied verbatim on
//! approval. PENDING is the only state that permits a transition; APPROVED
//! and REJECTED are terminal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::waste::WasteSeverity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("unknown approval status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Update,
    Delete,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Update => "update",
            ApprovalAction::Delete => "delete",
        }
    }
}

impl FromStr for ApprovalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(ApprovalAction::Update),
            "delete" => Ok(ApprovalAction::Delete),
            other => Err(format!("unknown approval action: {}", other)),
        }
    }
}

/// Entity types a request may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalTarget {
    InventoryItem,
    WasteLog,
}

impl ApprovalTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalTarget::InventoryItem => "inventory_item",
            ApprovalTarget::WasteLog => "waste_log",
        }
    }
}

impl FromStr for ApprovalTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory_item" => Ok(ApprovalTarget::InventoryItem),
            "waste_log" => Ok(ApprovalTarget::WasteLog),
            other => Err(format!("unknown approval target: {}", other)),
        }
    }
}

/// Fields of an inventory batch a request may change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemPatch {
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub category: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl InventoryItemPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.unit_cost.is_none()
            && self.category.is_none()
            && self.expires_at.is_none()
    }
}

/// Fields of a waste log a request may change. Quantity and cost are absent
/// deliberately: cost is always ledger-computed and never editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteLogPatch {
    pub reason: Option<String>,
    pub severity: Option<WasteSeverity>,
    pub preventable: Option<bool>,
}

impl WasteLogPatch {
    pub fn is_empty(&self) -> bool {
        self.reason.is_none() && self.severity.is_none() && self.preventable.is_none()
    }
}

/// Snapshot of the proposed field changes, keyed by target entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", content = "fields", rename_all = "snake_case")]
pub enum ProposedChange {
    InventoryItem(InventoryItemPatch),
    WasteLog(WasteLogPatch),
}

impl ProposedChange {
    pub fn target(&self) -> ApprovalTarget {
        match self {
            ProposedChange::InventoryItem(_) => ApprovalTarget::InventoryItem,
            ProposedChange::WasteLog(_) => ApprovalTarget::WasteLog,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ProposedChange::InventoryItem(patch) => patch.is_empty(),
            ProposedChange::WasteLog(patch) => patch.is_empty(),
        }
    }
}

/// A pending or resolved approval request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub submitted_by: Uuid,
    pub target_type: ApprovalTarget,
    pub target_id: Uuid,
    pub action: ApprovalAction,
    pub payload: Option<ProposedChange>,
    pub reason: Option<String>,
    pub status: ApprovalStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Guard for review: once a request is resolved it is immutable.
    pub fn ensure_pending(&self) -> Result<(), ApprovalError> {
        if self.status.is_terminal() {
            return Err(ApprovalError::AlreadyResolved(self.status));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("request was already {}", .0.as_str())]
    AlreadyResolved(ApprovalStatus),

    #[error("update requests must carry proposed field changes")]
    MissingPayload,

    #[error("proposed changes contain no fields")]
    EmptyPayload,

    #[error("payload targets {}, request targets {}", .payload.as_str(), .target.as_str())]
    PayloadMismatch {
        target: ApprovalTarget,
        payload: ApprovalTarget,
    },

    #[error("delete requests must not carry proposed field changes")]
    UnexpectedPayload,
}

/// Validate a submission before the request row is created: an update must
/// carry a non-empty payload matching the target type; a delete must carry
/// none. Review-time validation goes no further than target existence — the
/// reviewer acts on the snapshot they saw.
pub fn validate_submission(
    target: ApprovalTarget,
    action: ApprovalAction,
    payload: Option<&ProposedChange>,
) -> Result<(), ApprovalError> {
    match action {
        ApprovalAction::Update => match payload {
            None => Err(ApprovalError::MissingPayload),
            Some(change) if change.target() != target => Err(ApprovalError::PayloadMismatch {
                target,
                payload: change.target(),
            }),
            Some(change) if change.is_empty() => Err(ApprovalError::EmptyPayload),
            Some(_) => Ok(()),
        },
        ApprovalAction::Delete => match payload {
            Some(_) => Err(ApprovalError::UnexpectedPayload),
            None => Ok(()),
        },
    }
}
