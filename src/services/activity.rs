//! Append-only audit trail of account and catalog actions

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::models::ActivityWithUser;

#[derive(Clone)]
pub struct ActivityService {
    db: SqlitePool,
}

impl ActivityService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn record(&self, user_id: i64, action: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO activity_log (user_id, action, created_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(action)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Newest first, joined with the acting username. Entries of deleted
    /// accounts drop out of the join.
    pub async fn list(&self) -> AppResult<Vec<ActivityWithUser>> {
        let entries = sqlx::query_as(
            "SELECT a.id, a.user_id, u.username, a.action, a.created_at \
             FROM activity_log a JOIN users u ON u.id = a.user_id \
             ORDER BY a.id DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(entries)
    }
}
