//! PostgreSQL notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use planhub_core::error::{AppError, ErrorKind};
use planhub_core::result::AppResult;
use planhub_core::types::id::{NotificationId, UserId};
use planhub_core::types::pagination::PageRequest;
use planhub_entity::notification::{Notification, NotificationCategory};

use super::{NotificationFilter, NotificationRepository};

/// Row shape of the `notifications` table.
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    user_id: UserId,
    category: String,
    title: String,
    body: String,
    link: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<NotificationCategory>().map_err(|e| {
            AppError::database(format!(
                "Stored notification {} has bad category: {}",
                row.id, e.message
            ))
        })?;
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            category,
            title: row.title,
            body: row.body,
            link: row.link,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}

fn rows_into(rows: Vec<NotificationRow>) -> AppResult<Vec<Notification>> {
    rows.into_iter().map(Notification::try_from).collect()
}

/// `LIMIT`/`OFFSET` binds for `page`, saturating at `BIGINT` range.
fn sql_window(page: &PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

/// Notification repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, n: &Notification) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, category, title, body, link, is_read, read_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(n.id)
        .bind(n.user_id)
        .bind(n.category.as_str())
        .bind(&n.title)
        .bind(&n.body)
        .bind(&n.link)
        .bind(n.is_read)
        .bind(n.read_at)
        .bind(n.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find notification", e)
            })?;
        row.map(Notification::try_from).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        filter: NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Notification>, u64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)",
        )
        .bind(user_id)
        .bind(filter.unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count notifications", e))?;

        // Newest rows form page 1; the outer ORDER BY restores reading order.
        let (limit, offset) = sql_window(page);
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM ( \
                 SELECT * FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE) \
                 ORDER BY created_at DESC, seq DESC LIMIT $3 OFFSET $4 \
             ) AS page ORDER BY created_at ASC, seq ASC",
        )
        .bind(user_id)
        .bind(filter.unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok((rows_into(rows)?, total.max(0) as u64))
    }

    async fn unread_count(&self, user_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, $2) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
            })?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_window_never_goes_negative() {
        let page = PageRequest::try_new(3, 25, 100).unwrap();
        assert_eq!(sql_window(&page), (25, 50));

        let huge = PageRequest::try_new(1 << 62, 4, 100).unwrap();
        assert_eq!(sql_window(&huge), (4, i64::MAX));
    }
}
