use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use color_eyre::{eyre::OptionExt, Result};
use ulid::Ulid;

use super::models::{AuthUser, User, UserRow, LOCAL_ACCOUNT};
use super::Db;
use crate::utils;

const USER_SELECT: &str = r#"
    SELECT
        u.id, u.username, u.is_admin, u.account_type_id, u.profile_id, u.profile_name, u.token,
        p.id AS photo_id,
        p.resource AS photo_resource,
        p.url AS photo_url,
        p.filename AS photo_filename,
        p.mime AS photo_mime,
        p.created_at AS photo_created_at,
        p.updated_at AS photo_updated_at
    FROM users u
    LEFT JOIN attachments p ON p.id = u.photo_id
"#;

const AUTH_USER_SELECT: &str =
    "SELECT id, username, is_admin, account_type_id FROM users";

impl Db {
    /// Creates a local (password) account with a fresh API token.
    pub async fn create_user(&self, username: &str, password: &str, is_admin: bool) -> Result<i64> {
        let password_hash = hash_password(password)?;
        let token = utils::access_token();
        let now = Utc::now();

        let user_id: i64 = sqlx::query_scalar(
            r#"INSERT INTO users (username, password_hash, is_admin, account_type_id, token, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .bind(LOCAL_ACCOUNT)
        .bind(token)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("new user created: id={user_id}, username={username}");
        Ok(user_id)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(&format!("{AUTH_USER_SELECT} WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_auth_user(&self, user_id: i64) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(&format!("{AUTH_USER_SELECT} WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Only local accounts can log in with a password.
    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        let stored_hash: Option<String> = sqlx::query_scalar(
            "SELECT password_hash FROM users WHERE username = ? AND account_type_id = ?",
        )
        .bind(username)
        .bind(LOCAL_ACCOUNT)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored_hash.is_some_and(|hash| verify_password(password, &hash)))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    pub async fn users_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Users ordered by username. `limit = None` returns everyone.
    pub async fn users(&self, offset: i64, limit: Option<i64>) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{USER_SELECT} ORDER BY u.username LIMIT ? OFFSET ?"
        ))
        .bind(limit.unwrap_or(-1))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update_password(&self, user_id: i64, password: &str) -> Result<()> {
        let password_hash = hash_password(password)?;
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("password updated for user_id={user_id}");
        Ok(())
    }

    pub async fn regenerate_token(&self, user_id: i64) -> Result<String> {
        let token = utils::access_token();
        sqlx::query("UPDATE users SET token = ?, updated_at = ? WHERE id = ?")
            .bind(&token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("access token regenerated for user_id={user_id}");
        Ok(token)
    }

    pub async fn find_user_id_by_token(&self, token: &str) -> Result<Option<i64>> {
        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }

    /// Returns the user linked to an OAuth profile, creating it on first login.
    pub async fn find_or_create_oauth_user(
        &self,
        account_type_id: i64,
        profile_id: &str,
        profile_name: &str,
        username: &str,
    ) -> Result<AuthUser> {
        let existing = sqlx::query_as::<_, AuthUser>(&format!(
            "{AUTH_USER_SELECT} WHERE account_type_id = ? AND profile_id = ?"
        ))
        .bind(account_type_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let username = if self.username_exists(username).await? {
            format!("{username}-{profile_id}")
        } else {
            username.to_string()
        };

        // Never used to log in: the account has no local password.
        let password_hash = hash_password(&Ulid::new().to_string())?;
        let now = Utc::now();

        let user_id: i64 = sqlx::query_scalar(
            r#"INSERT INTO users (username, password_hash, is_admin, account_type_id, profile_id, profile_name, token, created_at, updated_at)
               VALUES (?, ?, FALSE, ?, ?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(&username)
        .bind(password_hash)
        .bind(account_type_id)
        .bind(profile_id)
        .bind(profile_name)
        .bind(utils::access_token())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("new oauth user created: id={user_id}, username={username}");

        self.get_auth_user(user_id)
            .await?
            .ok_or_eyre("could not load oauth user after insert")
    }

    pub async fn set_user_photo(&self, user_id: i64, photo_id: Option<i64>) -> Result<()> {
        sqlx::query("UPDATE users SET photo_id = ?, updated_at = ? WHERE id = ?")
            .bind(photo_id)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes the user. Sessions of that user lose their login through the
    /// `sessions.user_id` foreign key.
    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("deleted user {user_id}");
        Ok(())
    }

    /// Creates the `admin` account, or resets its password if it exists.
    pub async fn ensure_admin(&self, password: &str) -> Result<()> {
        match self.find_user_by_username("admin").await? {
            Some(user) => {
                self.update_password(user.id, password).await?;
                sqlx::query("UPDATE users SET is_admin = TRUE WHERE id = ?")
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                self.create_user("admin", password, true).await?;
            }
        }

        tracing::info!("admin account is ready");
        Ok(())
    }
}

/// Run argon2 hashing on a dedicated thread with a large stack to avoid
/// stack overflow in debug builds.
fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| color_eyre::eyre::eyre!("failed to hash password: {e}"))
        })?
        .join()
        .map_err(|_| color_eyre::eyre::eyre!("hash thread panicked"))?
}

fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let Ok(parsed_hash) = PasswordHash::new(&hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .map(|h| h.join().unwrap_or(false))
        .unwrap_or(false)
}
