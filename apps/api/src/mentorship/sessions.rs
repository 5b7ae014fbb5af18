//! Session Registry: durable records of scheduled 1:1 sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub meeting_link: String,
    pub guide_id: Uuid,
    pub invited_programmer_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub title: String,
    pub description: String,
    pub meeting_link: String,
    pub guide_id: Uuid,
    pub invited_programmer_email: String,
}

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn create(&self, session: NewSession) -> Result<SessionRow, AppError>;

    /// All sessions, newest first.
    async fn list_all(&self) -> Result<Vec<SessionRow>, AppError>;

    async fn list_for_guide(&self, guide_id: Uuid) -> Result<Vec<SessionRow>, AppError>;

    /// Sessions a programmer is invited to, matched on invitation email.
    async fn list_for_programmer(&self, email: &str) -> Result<Vec<SessionRow>, AppError>;
}

pub struct PgSessionRegistry {
    pool: PgPool,
}

impl PgSessionRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRegistry for PgSessionRegistry {
    async fn create(&self, session: NewSession) -> Result<SessionRow, AppError> {
        Ok(sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO qa_sessions
                (id, title, description, meeting_link, guide_id, invited_programmer_email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&session.title)
        .bind(&session.description)
        .bind(&session.meeting_link)
        .bind(session.guide_id)
        .bind(&session.invited_programmer_email)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_all(&self) -> Result<Vec<SessionRow>, AppError> {
        Ok(sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM qa_sessions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_for_guide(&self, guide_id: Uuid) -> Result<Vec<SessionRow>, AppError> {
        Ok(sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM qa_sessions WHERE guide_id = $1 ORDER BY created_at DESC",
        )
        .bind(guide_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_for_programmer(&self, email: &str) -> Result<Vec<SessionRow>, AppError> {
        Ok(sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM qa_sessions WHERE invited_programmer_email = $1 ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?)
    }
}
