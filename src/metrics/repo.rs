use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;

/// Aggregate reads scoped to one event creator. Each call is an independent read.
#[async_trait]
pub trait MetricsRepo: Send + Sync {
    /// Tickets with `status_id` on events created by `creator_id`.
    async fn count_attendees(&self, creator_id: i32, status_id: i32) -> Result<i64, AppError>;
    async fn count_events(&self, creator_id: i32) -> Result<i64, AppError>;
    /// Photos across all events created by `creator_id`.
    async fn count_pictures(&self, creator_id: i32) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct PgMetricsRepo {
    db: PgPool,
}

impl PgMetricsRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetricsRepo for PgMetricsRepo {
    async fn count_attendees(&self, creator_id: i32, status_id: i32) -> Result<i64, AppError> {
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(t.id)::BIGINT
              FROM events e
              JOIN tickets t ON t.event_id = e.id
             WHERE e.creator_id = $1
               AND t.status_id = $2
            "#,
        )
        .bind(creator_id)
        .bind(status_id)
        .fetch_one(&self.db)
        .await?;
        Ok(n)
    }

    async fn count_events(&self, creator_id: i32) -> Result<i64, AppError> {
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)::BIGINT
              FROM events
             WHERE creator_id = $1
            "#,
        )
        .bind(creator_id)
        .fetch_one(&self.db)
        .await?;
        Ok(n)
    }

    async fn count_pictures(&self, creator_id: i32) -> Result<i64, AppError> {
        // LEFT JOIN keeps photo-less events; COALESCE turns an empty aggregate into 0.
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(COUNT(p.id), 0)::BIGINT
              FROM events e
              LEFT JOIN photos p ON p.event_id = e.id
             WHERE e.creator_id = $1
            "#,
        )
        .bind(creator_id)
        .fetch_one(&self.db)
        .await?;
        Ok(n)
    }
}
