//! Server-side browser sessions.
//!
//! The cookie only carries an opaque id. Everything else lives in the
//! `sessions` table and is loaded before the handler runs and saved after.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{
    names, rejections::AppError, services::random_play::RandomPlay, utils, AppState,
};

/// A logged-in user who makes no request for this long is logged out.
pub const LOGIN_IDLE_SECS: i64 = 5 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// An OAuth login waiting for its callback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingOAuth {
    pub provider: String,
    pub state: String,
    pub verifier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub login_expires: Option<DateTime<Utc>>,
    pub random_play: RandomPlay,
    pub flash: Vec<Flash>,
    pub back_url: Option<String>,
    pub oauth: Option<PendingOAuth>,
}

#[derive(Debug)]
struct Inner {
    id: String,
    user_id: Option<i64>,
    data: SessionData,
    is_new: bool,
    /// Set when the id was rotated on login. The old row is dropped on save.
    replaced_id: Option<String>,
}

/// Handle to the current request's session, shared between the middleware
/// and the handler.
#[derive(Clone, Debug)]
pub struct Session(Arc<Mutex<Inner>>);

impl Session {
    fn new(id: String, user_id: Option<i64>, data: SessionData, is_new: bool) -> Self {
        Session(Arc::new(Mutex::new(Inner {
            id,
            user_id,
            data,
            is_new,
            replaced_id: None,
        })))
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.lock().user_id
    }

    /// Logs the user in under a fresh session id.
    pub fn login(&self, user_id: i64) {
        let mut inner = self.0.lock();
        if !inner.is_new && inner.replaced_id.is_none() {
            inner.replaced_id = Some(inner.id.clone());
        }
        inner.id = Ulid::new().to_string();
        inner.is_new = true;
        inner.user_id = Some(user_id);
        inner.data.login_expires = Some(Utc::now() + Duration::seconds(LOGIN_IDLE_SECS));
    }

    pub fn logout(&self) {
        let mut inner = self.0.lock();
        inner.user_id = None;
        inner.data.login_expires = None;
    }

    pub fn flash(&self, kind: FlashKind, message: impl Into<String>) {
        self.0.lock().data.flash.push(Flash {
            kind,
            message: message.into(),
        });
    }

    pub fn take_flashes(&self) -> Vec<Flash> {
        std::mem::take(&mut self.0.lock().data.flash)
    }

    pub fn random_play(&self) -> RandomPlay {
        self.0.lock().data.random_play.clone()
    }

    pub fn set_random_play(&self, state: RandomPlay) {
        self.0.lock().data.random_play = state;
    }

    pub fn set_back_url(&self, url: String) {
        self.0.lock().data.back_url = Some(url);
    }

    /// The saved "go back" URL, consumed.
    pub fn take_back_url(&self) -> Option<String> {
        self.0.lock().data.back_url.take()
    }

    pub fn set_oauth(&self, pending: PendingOAuth) {
        self.0.lock().data.oauth = Some(pending);
    }

    pub fn take_oauth(&self) -> Option<PendingOAuth> {
        self.0.lock().data.oauth.take()
    }

    /// Drops an expired login and pushes a live one forward.
    fn touch_login(&self, now: DateTime<Utc>) {
        let mut inner = self.0.lock();
        if inner.user_id.is_none() {
            return;
        }

        match inner.data.login_expires {
            Some(expires) if expires >= now => {
                inner.data.login_expires = Some(now + Duration::seconds(LOGIN_IDLE_SECS));
            }
            _ => {
                tracing::debug!("login of user {:?} expired", inner.user_id);
                inner.user_id = None;
                inner.data.login_expires = None;
                inner.data.flash.push(Flash {
                    kind: FlashKind::Info,
                    message: "User session has expired.".to_string(),
                });
            }
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::Internal("session layer is missing"))
    }
}

/// Loads the session named by the cookie (or starts one), runs the request,
/// then saves the session and sets the cookie when needed.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = load(&state, &jar).await;
    session.touch_login(Utc::now());
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    let (id, user_id, data, is_new, replaced_id) = {
        let mut inner = session.0.lock();
        let snapshot = (
            inner.id.clone(),
            inner.user_id,
            inner.data.clone(),
            inner.is_new,
            inner.replaced_id.take(),
        );
        inner.is_new = false;
        snapshot
    };

    if let Some(old_id) = replaced_id {
        if let Err(e) = state.db.delete_session(&old_id).await {
            tracing::warn!("could not delete replaced session: {e}");
        }
    }

    // Nothing worth keeping in a session nobody has seen yet.
    if is_new && user_id.is_none() && data == SessionData::default() {
        return response;
    }

    let expires_at = Utc::now() + Duration::seconds(utils::COOKIE_MAX_AGE_SECS);
    let saved = match serde_json::to_string(&data) {
        Ok(json) => state.db.save_session(&id, user_id, &json, expires_at).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = saved {
        tracing::error!("could not save session: {e}");
        return response;
    }

    if is_new {
        let cookie = utils::cookie(names::SESSION_COOKIE_NAME, &id, state.config.secure_cookies);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("invalid session cookie: {e}"),
        }
    }

    response
}

async fn load(state: &AppState, jar: &CookieJar) -> Session {
    let Some(id) = jar.get(names::SESSION_COOKIE_NAME).map(|c| c.value().to_string()) else {
        return Session::new(Ulid::new().to_string(), None, SessionData::default(), true);
    };

    match state.db.load_session(&id).await {
        Ok(Some(record)) => {
            let data = serde_json::from_str(&record.data).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable session data: {e}");
                SessionData::default()
            });
            Session::new(record.id, record.user_id, data, false)
        }
        Ok(None) => Session::new(Ulid::new().to_string(), None, SessionData::default(), true),
        Err(e) => {
            tracing::error!("could not load session: {e}");
            Session::new(Ulid::new().to_string(), None, SessionData::default(), true)
        }
    }
}
