use chrono::Utc;
use color_eyre::Result;

use super::models::{AttachmentModel, NewAttachment};
use super::Db;

const ATTACHMENT_SELECT: &str =
    "SELECT id, resource, url, filename, mime, created_at, updated_at FROM attachments";

impl Db {
    pub async fn create_attachment(&self, new: &NewAttachment) -> Result<AttachmentModel> {
        let now = Utc::now();
        let attachment = sqlx::query_as::<_, AttachmentModel>(
            r#"INSERT INTO attachments (resource, url, filename, mime, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING id, resource, url, filename, mime, created_at, updated_at"#,
        )
        .bind(&new.resource)
        .bind(&new.url)
        .bind(&new.filename)
        .bind(&new.mime)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("attachment {} created for {}", attachment.id, attachment.resource);
        Ok(attachment)
    }

    pub async fn get_attachment(&self, attachment_id: i64) -> Result<Option<AttachmentModel>> {
        let attachment =
            sqlx::query_as::<_, AttachmentModel>(&format!("{ATTACHMENT_SELECT} WHERE id = ?"))
                .bind(attachment_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(attachment)
    }

    /// Owners pointing at the row get their reference cleared by the foreign key.
    pub async fn delete_attachment(&self, attachment_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(attachment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
