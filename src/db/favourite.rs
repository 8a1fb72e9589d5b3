use color_eyre::Result;

use super::Db;

impl Db {
    /// Makes the user a fan of the quiz. Adding twice is a no-op.
    pub async fn add_fan(&self, quiz_id: i64, user_id: i64) -> Result<()> {
        let result = sqlx::query("INSERT OR IGNORE INTO favourites (user_id, quiz_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!("user {user_id} is now a fan of quiz {quiz_id}");
        }
        Ok(())
    }

    pub async fn remove_fan(&self, quiz_id: i64, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM favourites WHERE user_id = ? AND quiz_id = ?")
            .bind(user_id)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn is_fan(&self, quiz_id: i64, user_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favourites WHERE user_id = ? AND quiz_id = ?)",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn fans_count(&self, quiz_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favourites WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
