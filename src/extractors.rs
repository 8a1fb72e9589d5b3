use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    db::models::AuthUser,
    rejections::{AppError, ResultExt},
    session::{Flash, Session},
    AppState,
};

/// Whether the request was sent by script (`X-Requested-With: XMLHttpRequest`).
pub struct IsXhr(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for IsXhr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_xhr = parts
            .headers
            .get("X-Requested-With")
            .and_then(|v: &axum::http::HeaderValue| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
        Ok(IsXhr(is_xhr))
    }
}

/// API response format, taken from the path suffix by the rewrite middleware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl<S: Send + Sync> FromRequestParts<S> for Format {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Format>().copied().unwrap_or_default())
    }
}

/// The logged-in user, if any.
pub struct CurrentUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let Some(user_id) = session.user_id() else {
            return Ok(CurrentUser(None));
        };

        let user = state
            .db
            .get_auth_user(user_id)
            .await
            .reject("could not load logged-in user")?;
        if user.is_none() {
            session.logout();
        }
        Ok(CurrentUser(user))
    }
}

/// Guard extractor for pages that require a login.
pub struct AuthGuard(pub AuthUser);

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await? {
            CurrentUser(Some(user)) => Ok(AuthGuard(user)),
            CurrentUser(None) => Err(AppError::Unauthorized),
        }
    }
}

/// The user owning the API access token. Resolved by the API token layer.
#[derive(Clone, Debug)]
pub struct TokenOwner(pub AuthUser);

impl<S: Send + Sync> FromRequestParts<S> for TokenOwner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenOwner>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// What every page layout needs: the viewer and the session for flashes.
pub struct PageCtx {
    pub user: Option<AuthUser>,
    pub session: Session,
    pub oauth_providers: Vec<crate::oauth::Provider>,
    pub open_register: bool,
}

impl PageCtx {
    pub fn flashes(&self) -> Vec<Flash> {
        self.session.take_flashes()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// The logged-in user, or `Unauthorized`.
    pub fn require_user(&self) -> Result<&AuthUser, AppError> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// Whether the viewer may open the registration form.
    pub fn can_register(&self) -> bool {
        self.open_register || self.is_admin()
    }
}

impl FromRequestParts<AppState> for PageCtx {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(PageCtx {
            user,
            session,
            oauth_providers: state.oauth.providers().collect(),
            open_register: state.config.open_register,
        })
    }
}
