//! Approval workflow service
//!
//! Staff actors cannot update or delete inventory batches or waste logs
//! directly; they submit an approval request carrying a snapshot of the
//! proposed change. A manager or owner reviews it: approval applies the
//! snapshot to the target inside the same transaction that flips the status,
//! so a failed application (target deleted concurrently) leaves the request
//! PENDING rather than silently approved. Resolved requests are immutable.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    validate_submission, ApprovalAction, ApprovalRequest, ApprovalStatus, ApprovalTarget,
    ProposedChange, Role,
};
use shared::types::TenantContext;

use crate::error::{AppError, AppResult};
use crate::services::LedgerService;

/// Approval workflow service
#[derive(Clone)]
pub struct ApprovalService {
    db: PgPool,
}

/// Database row for an approval request
#[derive(Debug, FromRow)]
struct ApprovalRow {
    id: Uuid,
    tenant_id: Uuid,
    branch_id: Uuid,
    submitted_by: Uuid,
    target_type: String,
    target_id: Uuid,
    action: String,
    payload: Option<serde_json::Value>,
    reason: Option<String>,
    status: String,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ApprovalRow {
    fn into_request(self) -> AppResult<ApprovalRequest> {
        let target_type = ApprovalTarget::from_str(&self.target_type).map_err(AppError::Internal)?;
        let action = ApprovalAction::from_str(&self.action).map_err(AppError::Internal)?;
        let status = ApprovalStatus::from_str(&self.status).map_err(AppError::Internal)?;
        let payload = match self.payload {
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| AppError::Internal(format!("Malformed approval payload: {}", e)))?,
            ),
            None => None,
        };
        Ok(ApprovalRequest {
            id: self.id,
            tenant_id: self.tenant_id,
            branch_id: self.branch_id,
            submitted_by: self.submitted_by,
            target_type,
            target_id: self.target_id,
            action,
            payload,
            reason: self.reason,
            status,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
        })
    }
}

const APPROVAL_COLUMNS: &str = "id, tenant_id, branch_id, submitted_by, target_type, target_id, \
                                action, payload, reason, status, reviewed_by, reviewed_at, \
                                created_at";

/// Input for submitting an approval request
#[derive(Debug, Deserialize)]
pub struct SubmitApprovalInput {
    pub branch_id: Option<Uuid>,
    pub target_type: ApprovalTarget,
    pub target_id: Uuid,
    pub action: ApprovalAction,
    pub payload: Option<ProposedChange>,
    pub reason: Option<String>,
}

/// Review decision
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ApprovalService {
    /// Create a new ApprovalService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Submit a request. Only the lowest-privilege mutating role goes
    /// through the workflow — higher roles mutate directly and a request
    /// from them would be a client bug. Does not touch the target entity.
    pub async fn submit(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        input: SubmitApprovalInput,
    ) -> AppResult<ApprovalRequest> {
        if ctx.role() != Role::Staff {
            return Err(AppError::InsufficientPermissions);
        }
        validate_submission(input.target_type, input.action, input.payload.as_ref())?;

        let tenant_id = ctx.tenant_id();
        let branch_id = match input.branch_id {
            Some(id) => id,
            None => ctx.branch_id()?,
        };

        // Target must exist in the caller's tenant. The same NotFound covers
        // "does not exist" and "belongs to another tenant".
        let exists = match input.target_type {
            ApprovalTarget::InventoryItem => {
                LedgerService::new(self.db.clone())
                    .batch_exists(ctx, input.target_id)
                    .await?
            }
            ApprovalTarget::WasteLog => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM waste_events WHERE id = $1 AND tenant_id = $2)",
                )
                .bind(input.target_id)
                .bind(tenant_id)
                .fetch_one(&self.db)
                .await?
            }
        };
        if !exists {
            return Err(AppError::NotFound(match input.target_type {
                ApprovalTarget::InventoryItem => "Batch".to_string(),
                ApprovalTarget::WasteLog => "Waste event".to_string(),
            }));
        }

        let payload_json = match &input.payload {
            Some(change) => Some(serde_json::to_value(change).map_err(|e| {
                AppError::Internal(format!("Failed to encode approval payload: {}", e))
            })?),
            None => None,
        };

        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            INSERT INTO approval_requests
                (tenant_id, branch_id, submitted_by, target_type, target_id, action, payload,
                 reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING {APPROVAL_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(branch_id)
        .bind(user_id)
        .bind(input.target_type.as_str())
        .bind(input.target_id)
        .bind(input.action.as_str())
        .bind(payload_json)
        .bind(&input.reason)
        .fetch_one(&self.db)
        .await?;

        row.into_request()
    }

    /// List requests for the tenant, optionally by status, newest first
    pub async fn list(
        &self,
        ctx: &TenantContext,
        status: Option<ApprovalStatus>,
    ) -> AppResult<Vec<ApprovalRequest>> {
        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            SELECT {APPROVAL_COLUMNS}
            FROM approval_requests
            WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(ctx.tenant_id())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ApprovalRow::into_request).collect()
    }

    /// Get a single request
    pub async fn get(&self, ctx: &TenantContext, request_id: Uuid) -> AppResult<ApprovalRequest> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM approval_requests WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(request_id)
        .bind(ctx.tenant_id())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Approval request".to_string()))?;

        row.into_request()
    }

    /// Review a pending request. Approval applies the snapshot payload and
    /// flips the status in one transaction; rejection only records the
    /// reviewer. Reviewing a resolved request fails with
    /// `InvalidStateTransition` and never re-applies the payload.
    pub async fn review(
        &self,
        ctx: &TenantContext,
        reviewer_id: Uuid,
        request_id: Uuid,
        decision: ReviewDecision,
    ) -> AppResult<ApprovalRequest> {
        if !ctx.role().can_review() {
            return Err(AppError::InsufficientPermissions);
        }

        let tenant_id = ctx.tenant_id();
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            SELECT {APPROVAL_COLUMNS}
            FROM approval_requests
            WHERE id = $1 AND tenant_id = $2
            FOR UPDATE
            "#
        ))
        .bind(request_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Approval request".to_string()))?;

        let request = row.into_request()?;
        request.ensure_pending()?;

        let new_status = match decision {
            ReviewDecision::Approve => {
                Self::apply_payload(&mut tx, &request).await?;
                ApprovalStatus::Approved
            }
            ReviewDecision::Reject => ApprovalStatus::Rejected,
        };

        let updated = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            UPDATE approval_requests
            SET status = $1, reviewed_by = $2, reviewed_at = NOW()
            WHERE id = $3 AND tenant_id = $4
            RETURNING {APPROVAL_COLUMNS}
            "#
        ))
        .bind(new_status.as_str())
        .bind(reviewer_id)
        .bind(request_id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        updated.into_request()
    }

    /// Apply the snapshot to the target entity. Any failure here aborts the
    /// surrounding transaction and the request stays PENDING.
    async fn apply_payload(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        request: &ApprovalRequest,
    ) -> AppResult<()> {
        match (request.target_type, request.action) {
            (ApprovalTarget::InventoryItem, ApprovalAction::Update) => {
                let patch = match &request.payload {
                    Some(ProposedChange::InventoryItem(patch)) => patch,
                    _ => {
                        return Err(AppError::Internal(
                            "Approval payload does not match its target".to_string(),
                        ))
                    }
                };
                LedgerService::update_batch_in_tx(tx, request.tenant_id, request.target_id, patch)
                    .await?;
            }
            (ApprovalTarget::InventoryItem, ApprovalAction::Delete) => {
                LedgerService::delete_batch_in_tx(tx, request.tenant_id, request.target_id).await?;
            }
            (ApprovalTarget::WasteLog, ApprovalAction::Update) => {
                let patch = match &request.payload {
                    Some(ProposedChange::WasteLog(patch)) => patch,
                    _ => {
                        return Err(AppError::Internal(
                            "Approval payload does not match its target".to_string(),
                        ))
                    }
                };
                let result = sqlx::query(
                    r#"
                    UPDATE waste_events
                    SET reason = COALESCE($1, reason),
                        severity = COALESCE($2, severity),
                        preventable = COALESCE($3, preventable)
                    WHERE id = $4 AND tenant_id = $5
                    "#,
                )
                .bind(patch.reason.as_deref())
                .bind(patch.severity.map(|s| s.as_str()))
                .bind(patch.preventable)
                .bind(request.target_id)
                .bind(request.tenant_id)
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound("Waste event".to_string()));
                }
            }
            (ApprovalTarget::WasteLog, ApprovalAction::Delete) => {
                let result =
                    sqlx::query("DELETE FROM waste_events WHERE id = $1 AND tenant_id = $2")
                        .bind(request.target_id)
                        .bind(request.tenant_id)
                        .execute(&mut **tx)
                        .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound("Waste event".to_string()));
                }
            }
        }
        Ok(())
    }
}
