use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Role, UserRow};

/// Read-only view over the user directory.
///
/// Carried in `AppState` as `Arc<dyn UserDirectory>` so the coordinator
/// and handlers can be exercised against an in-memory directory in tests.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetches a user by id, or `NotFound`.
    async fn fetch(&self, user_id: Uuid) -> Result<UserRow, AppError>;

    /// Looks a user up by email. Unknown emails are not an error here;
    /// callers decide whether absence matters.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError>;

    /// All users carrying the guide role.
    async fn list_guides(&self) -> Result<Vec<UserRow>, AppError>;
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn fetch(&self, user_id: Uuid) -> Result<UserRow, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError> {
        Ok(
            sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_guides(&self) -> Result<Vec<UserRow>, AppError> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE role = $1 ORDER BY name ASC",
        )
        .bind(Role::Guide.as_str())
        .fetch_all(&self.pool)
        .await?)
    }
}
