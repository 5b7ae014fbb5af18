//! Notification Store: durable per-recipient notifications.
//!
//! Payloads are a closed set of kinds carrying structured fields; the
//! human-readable message is rendered once at creation time. The read
//! flag is monotonic: once a notification is read it never regresses to
//! unread.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// To the guide when a programmer submits a request.
    RequestReceived { programmer_name: String },
    /// To the programmer when the guide approves.
    SessionApproved {
        guide_name: String,
        meeting_link: String,
    },
    /// To the programmer when the guide rejects.
    SessionRejected { guide_name: String },
    /// To the programmer when a guide schedules a session directly,
    /// outside the request workflow.
    SessionScheduled { title: String },
}

impl NotificationKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationKind::RequestReceived { .. } => "request_received",
            NotificationKind::SessionApproved { .. } => "session_approved",
            NotificationKind::SessionRejected { .. } => "session_rejected",
            NotificationKind::SessionScheduled { .. } => "session_scheduled",
        }
    }

    /// Renders the message shown to the recipient.
    pub fn message(&self) -> String {
        match self {
            NotificationKind::RequestReceived { programmer_name } => {
                format!("You have a new session request from {programmer_name}.")
            }
            NotificationKind::SessionApproved {
                guide_name,
                meeting_link,
            } => format!(
                "Your session request has been approved. Join {guide_name} here: {meeting_link}"
            ),
            NotificationKind::SessionRejected { guide_name } => {
                format!("Your session request has been rejected by {guide_name}.")
            }
            NotificationKind::SessionScheduled { title } => {
                format!("A new 1:1 session has been created for you: {title}")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Creates an unread notification for the recipient.
    async fn create(
        &self,
        recipient_id: Uuid,
        kind: &NotificationKind,
    ) -> Result<NotificationRow, AppError>;

    /// All notifications for a recipient, newest first.
    async fn list_for(&self, recipient_id: Uuid) -> Result<Vec<NotificationRow>, AppError>;

    /// Marks a notification read. Idempotent on already-read rows; the
    /// flag never moves back to unread.
    async fn mark_read(&self, notification_id: Uuid) -> Result<(), AppError>;
}

pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(
        &self,
        recipient_id: Uuid,
        kind: &NotificationKind,
    ) -> Result<NotificationRow, AppError> {
        Ok(sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, recipient_id, kind, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recipient_id)
        .bind(kind.tag())
        .bind(kind.message())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_for(&self, recipient_id: Uuid) -> Result<Vec<NotificationRow>, AppError> {
        Ok(sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Notification {notification_id} not found"
            )));
        }
        Ok(())
    }
}
