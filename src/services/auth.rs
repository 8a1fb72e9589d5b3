use color_eyre::Result;

use crate::db::models::AuthUser;
use crate::db::Db;

// ---------------------------------------------------------------------------
// AuthRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn username_exists(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> impl std::future::Future<Output = Result<i64>> + Send;

    fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_user_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn update_password(
        &self,
        user_id: i64,
        password: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl AuthRepository for Db {
    async fn username_exists(&self, username: &str) -> Result<bool> {
        Db::username_exists(self, username).await
    }

    async fn create_user(&self, username: &str, password: &str, is_admin: bool) -> Result<i64> {
        Db::create_user(self, username, password, is_admin).await
    }

    async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        Db::verify_user_password(self, username, password).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>> {
        Db::find_user_by_username(self, username).await
    }

    async fn update_password(&self, user_id: i64, password: &str) -> Result<()> {
        Db::update_password(self, user_id, password).await
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum LoginOutcome {
    Success(AuthUser),
    /// Wrong password, unknown user, or an OAuth-only account.
    InvalidCredentials,
}

pub enum RegisterOutcome {
    /// Contains the new user id.
    Created(i64),
    EmptyUsername,
    EmptyPassword,
    UsernameTaken(String),
}

impl RegisterOutcome {
    /// The form message for a rejected registration.
    pub fn message(&self) -> Option<String> {
        match self {
            RegisterOutcome::Created(_) => None,
            RegisterOutcome::EmptyUsername => Some("Username must not be empty.".to_string()),
            RegisterOutcome::EmptyPassword => Some("Password must not be empty.".to_string()),
            RegisterOutcome::UsernameTaken(name) => Some(format!("User \"{name}\" already exists.")),
        }
    }
}

pub enum UpdatePasswordOutcome {
    Updated,
    /// No new password was given, so the old one stays.
    Unchanged,
    /// OAuth accounts have no local password.
    NotLocal,
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !self.repo.verify_user_password(username, password).await? {
            tracing::info!("failed login attempt for {username}");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| color_eyre::eyre::eyre!("user not found after password verification"))?;

        tracing::info!("user {} logged in", user.id);
        Ok(LoginOutcome::Success(user))
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<RegisterOutcome> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(RegisterOutcome::EmptyUsername);
        }
        if password.is_empty() {
            return Ok(RegisterOutcome::EmptyPassword);
        }

        if self.repo.username_exists(username).await? {
            return Ok(RegisterOutcome::UsernameTaken(username.to_string()));
        }

        let user_id = self.repo.create_user(username, password, is_admin).await?;
        Ok(RegisterOutcome::Created(user_id))
    }

    pub async fn update_password(
        &self,
        user: &crate::db::models::User,
        new_password: &str,
    ) -> Result<UpdatePasswordOutcome> {
        if !user.is_local() {
            return Ok(UpdatePasswordOutcome::NotLocal);
        }
        if new_password.is_empty() {
            return Ok(UpdatePasswordOutcome::Unchanged);
        }

        self.repo.update_password(user.id, new_password).await?;
        Ok(UpdatePasswordOutcome::Updated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
