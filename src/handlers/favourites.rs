use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::put,
    Router,
};

use crate::{
    db::models::AuthUser,
    extractors::{AuthGuard, IsXhr},
    handlers::go_back,
    rejections::{AppError, OptionExt, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/favourites/{quiz_id}",
        put(add).delete(remove),
    )
}

/// Marks or unmarks `quiz_id` as a favourite of `user`. Both directions are
/// idempotent. The quiz must exist.
pub async fn toggle(state: &AppState, user: &AuthUser, quiz_id: i64, fan: bool) -> Result<(), AppError> {
    state
        .db
        .get_quiz(quiz_id, None)
        .await
        .reject("could not load quiz")?
        .or_not_found("Quiz not found")?;

    if fan {
        state.db.add_fan(quiz_id, user.id).await.reject("could not add favourite")?;
    } else {
        state
            .db
            .remove_fan(quiz_id, user.id)
            .await
            .reject("could not remove favourite")?;
    }
    Ok(())
}

async fn add(
    State(state): State<AppState>,
    AuthGuard(user): AuthGuard,
    IsXhr(is_xhr): IsXhr,
    Path((user_id, quiz_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    respond(&state, &user, user_id, quiz_id, true, is_xhr).await
}

async fn remove(
    State(state): State<AppState>,
    AuthGuard(user): AuthGuard,
    IsXhr(is_xhr): IsXhr,
    Path((user_id, quiz_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    respond(&state, &user, user_id, quiz_id, false, is_xhr).await
}

async fn respond(
    state: &AppState,
    user: &AuthUser,
    user_id: i64,
    quiz_id: i64,
    fan: bool,
    is_xhr: bool,
) -> Result<Response, AppError> {
    // Favourites are self-service, even for admins.
    if user.id != user_id {
        return Err(AppError::Forbidden);
    }
    toggle(state, user, quiz_id, fan).await?;

    if is_xhr {
        Ok(StatusCode::OK.into_response())
    } else {
        Ok(go_back().into_response())
    }
}
