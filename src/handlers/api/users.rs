use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::{
    db::models::{Media, User, UserProfile},
    extractors::{Format, TokenOwner},
    handlers::api::{reply, reply_list},
    rejections::{ApiError, OptionExt, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/tokenOwner", get(token_owner))
        .route("/users/{id}", get(show))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub id: i64,
    pub is_admin: bool,
    pub username: String,
    pub photo: Option<Media>,
}

impl From<UserProfile> for ApiUser {
    fn from(profile: UserProfile) -> Self {
        ApiUser {
            id: profile.id,
            is_admin: profile.is_admin,
            username: profile.username,
            photo: profile.photo,
        }
    }
}

impl From<&User> for ApiUser {
    fn from(user: &User) -> Self {
        user.profile().into()
    }
}

async fn index(State(state): State<AppState>, format: Format) -> Result<Response, ApiError> {
    let users = state.db.users(0, None).await.reject("could not list users")?;
    let users: Vec<ApiUser> = users.iter().map(ApiUser::from).collect();
    reply_list(format, "users", "user", &users)
}

async fn load(state: &AppState, user_id: i64) -> Result<ApiUser, ApiError> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .reject("could not load user")?
        .or_not_found("User not found")?;
    Ok(ApiUser::from(&user))
}

async fn show(
    State(state): State<AppState>,
    format: Format,
    Path(user_id): Path<i64>,
) -> Result<Response, ApiError> {
    reply(format, "user", &load(&state, user_id).await?)
}

async fn token_owner(
    State(state): State<AppState>,
    format: Format,
    TokenOwner(owner): TokenOwner,
) -> Result<Response, ApiError> {
    reply(format, "user", &load(&state, owner.id).await?)
}
