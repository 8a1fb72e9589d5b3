use chrono::{DateTime, Utc};
use color_eyre::Result;

use super::Db;

/// A persisted browser session. `data` is the JSON document of
/// [`crate::session::SessionData`].
#[derive(Debug, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: Option<i64>,
    pub data: String,
}

impl Db {
    /// Loads a session that has not expired yet.
    pub async fn load_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, data FROM sessions WHERE id = ? AND expires_at > ?",
        )
        .bind(session_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn save_session(
        &self,
        session_id: &str,
        user_id: Option<i64>,
        data: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO sessions (id, user_id, expires_at, data) VALUES (?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   user_id = excluded.user_id,
                   expires_at = excluded.expires_at,
                   data = excluded.data"#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .bind(data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns the number of purged rows.
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
