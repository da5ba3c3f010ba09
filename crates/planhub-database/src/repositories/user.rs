//! PostgreSQL user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_core::types::id::UserId;
use planhub_entity::notification::PreferenceMap;
use planhub_entity::user::{User, UserRole};

use super::UserRepository;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    role: String,
    notification_preferences: Json<PreferenceMap>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            role: row.role.parse::<UserRole>()?,
            notification_preferences: row.notification_preferences.0,
            created_at: row.created_at,
        })
    }
}

/// User repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, role, notification_preferences, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(Json(&user.notification_preferences))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create user", e))?;
        Ok(())
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &PreferenceMap,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET notification_preferences = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(preferences))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update preferences", e))?;
        row.map(User::try_from).transpose()
    }

    async fn merge_preferences(
        &self,
        id: UserId,
        changes: &PreferenceMap,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET notification_preferences = notification_preferences || $2 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(changes))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to merge preferences", e))?;
        row.map(User::try_from).transpose()
    }
}
