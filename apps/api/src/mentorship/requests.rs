#![allow(dead_code)]

//! Session Request Ledger: the authoritative state machine for
//! mentorship requests.
//!
//! A request is created pending and resolved exactly once:
//! `pending → approved` or `pending → rejected`. Terminal states are
//! immutable; a second resolve attempt is rejected, never silently
//! accepted. Requests are never physically deleted (audit trail).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<RequestStatus> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A guide's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

/// Applies a decision to the current status.
/// The only legal transitions are out of `Pending`.
pub fn transition(current: RequestStatus, decision: Decision) -> Result<RequestStatus, AppError> {
    if current.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Request is already {} and cannot be resolved again",
            current.as_str()
        )));
    }
    Ok(decision.target_status())
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRequestRow {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub programmer_id: Uuid,
    pub programmer_name: String,
    pub programmer_email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Durable ledger of session requests.
#[async_trait]
pub trait RequestLedger: Send + Sync {
    /// Creates a pending request. Concurrent submissions by the same
    /// programmer to the same guide are all accepted; there is no dedup
    /// constraint on the pair.
    async fn submit(
        &self,
        guide_id: Uuid,
        programmer: &UserRow,
    ) -> Result<SessionRequestRow, AppError>;

    /// All non-terminal requests for a guide, oldest first.
    async fn list_pending(&self, guide_id: Uuid) -> Result<Vec<SessionRequestRow>, AppError>;

    /// Moves a pending request to its terminal state and returns the
    /// updated row. `NotFound` for unknown ids, `InvalidState` if the
    /// request is already terminal.
    async fn resolve(
        &self,
        request_id: Uuid,
        decision: Decision,
    ) -> Result<SessionRequestRow, AppError>;
}

pub struct PgRequestLedger {
    pool: PgPool,
}

impl PgRequestLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestLedger for PgRequestLedger {
    async fn submit(
        &self,
        guide_id: Uuid,
        programmer: &UserRow,
    ) -> Result<SessionRequestRow, AppError> {
        Ok(sqlx::query_as::<_, SessionRequestRow>(
            r#"
            INSERT INTO session_requests
                (id, guide_id, programmer_id, programmer_name, programmer_email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(guide_id)
        .bind(programmer.id)
        .bind(&programmer.name)
        .bind(&programmer.email)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_pending(&self, guide_id: Uuid) -> Result<Vec<SessionRequestRow>, AppError> {
        Ok(sqlx::query_as::<_, SessionRequestRow>(
            r#"
            SELECT * FROM session_requests
            WHERE guide_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .bind(guide_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn resolve(
        &self,
        request_id: Uuid,
        decision: Decision,
    ) -> Result<SessionRequestRow, AppError> {
        // Guarded update: only a pending row can move. A lost race shows
        // up as zero rows and is reported from the current status below.
        let updated = sqlx::query_as::<_, SessionRequestRow>(
            r#"
            UPDATE session_requests
            SET status = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(decision.target_status().as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(row);
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM session_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(AppError::NotFound(format!(
                "Session request {request_id} not found"
            ))),
            Some(status) => Err(AppError::InvalidState(format!(
                "Request is already {status} and cannot be resolved again"
            ))),
        }
    }
}
