//! The token-authenticated JSON/XML API under `/api`.
//!
//! Every call carries `?token=`. The `quizzes/randomPlay/*` calls also keep
//! their run in the cookie session, so clients must send back the cookie
//! they receive from `randomPlay/new`.

mod favourites;
mod quizzes;
mod random_play;
mod users;

use axum::{
    extract::{Query, Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    extractors::{Format, TokenOwner},
    rejections::{ApiError, AppError, ResultExt},
    xml, AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(quizzes::routes())
        .merge(favourites::routes())
        .merge(random_play::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, token_layer))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn not_found() -> ApiError {
    ApiError(AppError::NotFound("API route not found"))
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Resolves `?token=` to its owner and stores it as [`TokenOwner`].
async fn token_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|q| q.0.token)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError(AppError::Unauthorized))?;

    let user_id = state
        .db
        .find_user_id_by_token(&token)
        .await
        .reject("could not check access token")?;
    let owner = match user_id {
        Some(user_id) => state
            .db
            .get_auth_user(user_id)
            .await
            .reject("could not load token owner")?,
        None => None,
    };
    let Some(owner) = owner else {
        tracing::debug!("rejected unknown access token");
        return Err(ApiError(AppError::Unauthorized));
    };

    req.extensions_mut().insert(TokenOwner(owner));
    Ok(next.run(req).await)
}

/// Renders `value` as JSON, or as XML under the `root` element.
pub fn reply<T: Serialize>(format: Format, root: &str, value: &T) -> Result<Response, ApiError> {
    let value = serde_json::to_value(value).reject("could not serialize response")?;
    Ok(match format {
        Format::Json => Json(value).into_response(),
        Format::Xml => (
            [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
            xml::to_xml(root, &value),
        )
            .into_response(),
    })
}

/// Renders a list. In XML the items repeat `item` inside `root`.
pub fn reply_list<T: Serialize>(
    format: Format,
    root: &str,
    item: &str,
    items: &[T],
) -> Result<Response, ApiError> {
    match format {
        Format::Json => reply(format, root, &items),
        Format::Xml => reply(format, root, &serde_json::json!({ item: items })),
    }
}
