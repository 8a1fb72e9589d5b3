use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::put,
    Router,
};

use crate::{
    extractors::TokenOwner,
    handlers::favourites::toggle,
    rejections::ApiError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/users/tokenOwner/favourites/{quiz_id}",
        put(add).delete(remove),
    )
}

async fn add(
    State(state): State<AppState>,
    TokenOwner(owner): TokenOwner,
    Path(quiz_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    toggle(&state, &owner, quiz_id, true).await?;
    Ok(StatusCode::OK)
}

async fn remove(
    State(state): State<AppState>,
    TokenOwner(owner): TokenOwner,
    Path(quiz_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    toggle(&state, &owner, quiz_id, false).await?;
    Ok(StatusCode::OK)
}
