use chrono::{DateTime, Utc};
use color_eyre::Result;
use sqlx::{QueryBuilder, Sqlite};

use super::models::{Quiz, QuizRow};
use super::Db;
use crate::utils;

/// Narrows quiz listings. Empty filter lists every quiz.
#[derive(Clone, Debug, Default)]
pub struct QuizFilter {
    pub search: Option<String>,
    pub author_id: Option<i64>,
    /// Only quizzes this user is a fan of.
    pub favourites_of: Option<i64>,
}

impl QuizFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND q.question LIKE ")
                .push_bind(utils::like_pattern(search));
        }
        if let Some(author_id) = self.author_id {
            qb.push(" AND q.author_id = ").push_bind(author_id);
        }
        if let Some(user_id) = self.favourites_of {
            qb.push(" AND EXISTS(SELECT 1 FROM favourites ff WHERE ff.quiz_id = q.id AND ff.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

fn quiz_select<'a>(viewer_id: Option<i64>) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT
            q.id, q.question, q.answer, q.created_at, q.updated_at, q.author_id,
            u.username AS author_username,
            u.is_admin AS author_is_admin,
            u.account_type_id AS author_account_type_id,
            u.profile_name AS author_profile_name,
            p.filename AS author_photo_filename,
            p.mime AS author_photo_mime,
            p.url AS author_photo_url,
            a.id AS attachment_id,
            a.resource AS attachment_resource,
            a.url AS attachment_url,
            a.filename AS attachment_filename,
            a.mime AS attachment_mime,
            a.created_at AS attachment_created_at,
            a.updated_at AS attachment_updated_at,
            EXISTS(SELECT 1 FROM favourites f WHERE f.quiz_id = q.id AND f.user_id = "#,
    );
    qb.push_bind(viewer_id);
    qb.push(
        r#") AS favourite
        FROM quizzes q
        LEFT JOIN users u ON u.id = q.author_id
        LEFT JOIN attachments p ON p.id = u.photo_id
        LEFT JOIN attachments a ON a.id = q.attachment_id
        "#,
    );
    qb
}

impl Db {
    pub async fn create_quiz(&self, author_id: i64, question: &str, answer: &str) -> Result<i64> {
        let now = Utc::now();
        let quiz_id: i64 = sqlx::query_scalar(
            "INSERT INTO quizzes (question, answer, author_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(question)
        .bind(answer)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("new quiz created with id: {quiz_id} for user_id: {author_id}");
        Ok(quiz_id)
    }

    pub async fn update_quiz(&self, quiz_id: i64, question: &str, answer: &str) -> Result<()> {
        sqlx::query("UPDATE quizzes SET question = ?, answer = ?, updated_at = ? WHERE id = ?")
            .bind(question)
            .bind(answer)
            .bind(Utc::now())
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("deleted quiz {quiz_id}");
        Ok(())
    }

    /// Loads a quiz with author, attachment and the viewer's favourite flag.
    pub async fn get_quiz(&self, quiz_id: i64, viewer_id: Option<i64>) -> Result<Option<Quiz>> {
        let mut qb = quiz_select(viewer_id);
        qb.push(" WHERE q.id = ").push_bind(quiz_id);

        let row = qb
            .build_query_as::<QuizRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Quiz::from))
    }

    pub async fn count_quizzes(&self, filter: &QuizFilter) -> Result<i64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM quizzes q");
        filter.push_where(&mut qb);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn quizzes(
        &self,
        filter: &QuizFilter,
        viewer_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Quiz>> {
        let mut qb = quiz_select(viewer_id);
        filter.push_where(&mut qb);
        qb.push(" ORDER BY q.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build_query_as::<QuizRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    pub async fn quiz_ids(&self) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM quizzes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn quizzes_created_since(&self, author_id: i64, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quizzes WHERE author_id = ? AND created_at > ?",
        )
        .bind(author_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn set_quiz_attachment(&self, quiz_id: i64, attachment_id: Option<i64>) -> Result<()> {
        sqlx::query("UPDATE quizzes SET attachment_id = ?, updated_at = ? WHERE id = ?")
            .bind(attachment_id)
            .bind(Utc::now())
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
