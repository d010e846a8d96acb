//! Approval workflow tests
//!
//! Submission-time payload validation (tagged union matching the target) and
//! the terminal-state rules of the review state machine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    validate_submission, ApprovalAction, ApprovalError, ApprovalRequest, ApprovalStatus,
    ApprovalTarget, InventoryItemPatch, ProposedChange, WasteLogPatch, WasteSeverity,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn inventory_patch() -> ProposedChange {
    ProposedChange::InventoryItem(InventoryItemPatch {
        quantity: Some(dec("4.5")),
        ..Default::default()
    })
}

fn waste_patch() -> ProposedChange {
    ProposedChange::WasteLog(WasteLogPatch {
        severity: Some(WasteSeverity::High),
        ..Default::default()
    })
}

fn request(status: ApprovalStatus) -> ApprovalRequest {
    let created = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    ApprovalRequest {
        id: Uuid::from_u128(10),
        tenant_id: Uuid::from_u128(1),
        branch_id: Uuid::from_u128(2),
        submitted_by: Uuid::from_u128(3),
        target_type: ApprovalTarget::InventoryItem,
        target_id: Uuid::from_u128(4),
        action: ApprovalAction::Update,
        payload: Some(inventory_patch()),
        reason: Some("miscount during stocktake".to_string()),
        status,
        reviewed_by: None,
        reviewed_at: None,
        created_at: created,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_update_requires_matching_payload() {
        assert!(validate_submission(
            ApprovalTarget::InventoryItem,
            ApprovalAction::Update,
            Some(&inventory_patch()),
        )
        .is_ok());

        assert_eq!(
            validate_submission(ApprovalTarget::InventoryItem, ApprovalAction::Update, None),
            Err(ApprovalError::MissingPayload)
        );

        assert_eq!(
            validate_submission(
                ApprovalTarget::InventoryItem,
                ApprovalAction::Update,
                Some(&waste_patch()),
            ),
            Err(ApprovalError::PayloadMismatch {
                target: ApprovalTarget::InventoryItem,
                payload: ApprovalTarget::WasteLog,
            })
        );
    }

    #[test]
    fn test_update_rejects_empty_payload() {
        let empty = ProposedChange::InventoryItem(InventoryItemPatch::default());

        assert_eq!(
            validate_submission(
                ApprovalTarget::InventoryItem,
                ApprovalAction::Update,
                Some(&empty),
            ),
            Err(ApprovalError::EmptyPayload)
        );
    }

    #[test]
    fn test_delete_takes_no_payload() {
        assert!(validate_submission(
            ApprovalTarget::WasteLog,
            ApprovalAction::Delete,
            None,
        )
        .is_ok());

        assert_eq!(
            validate_submission(
                ApprovalTarget::WasteLog,
                ApprovalAction::Delete,
                Some(&waste_patch()),
            ),
            Err(ApprovalError::UnexpectedPayload)
        );
    }

    /// PENDING is the only reviewable state.
    #[test]
    fn test_only_pending_is_reviewable() {
        assert!(request(ApprovalStatus::Pending).ensure_pending().is_ok());

        assert_eq!(
            request(ApprovalStatus::Approved).ensure_pending(),
            Err(ApprovalError::AlreadyResolved(ApprovalStatus::Approved))
        );
        assert_eq!(
            request(ApprovalStatus::Rejected).ensure_pending(),
            Err(ApprovalError::AlreadyResolved(ApprovalStatus::Rejected))
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
    }

    /// The payload snapshot survives a JSON round trip through its stored
    /// tagged-union form.
    #[test]
    fn test_payload_json_round_trip() {
        let change = inventory_patch();
        let value = serde_json::to_value(&change).unwrap();

        assert_eq!(value["target"], "inventory_item");
        assert!(value["fields"].is_object());

        let back: ProposedChange = serde_json::from_value(value).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(InventoryItemPatch::default().is_empty());
        assert!(WasteLogPatch::default().is_empty());
        assert!(!inventory_patch().is_empty());
        assert!(!waste_patch().is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = ApprovalStatus> {
        prop_oneof![
            Just(ApprovalStatus::Pending),
            Just(ApprovalStatus::Approved),
            Just(ApprovalStatus::Rejected),
        ]
    }

    proptest! {
        /// A request is reviewable exactly when it is not terminal, so a
        /// resolved request can never be re-applied.
        #[test]
        fn prop_reviewable_iff_not_terminal(status in status_strategy()) {
            let reviewable = request(status).ensure_pending().is_ok();
            prop_assert_eq!(reviewable, !status.is_terminal());
        }
    }
}
