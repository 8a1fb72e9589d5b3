pub mod config;
pub mod db;
pub mod extractors;
pub mod handlers;
pub mod names;
pub mod oauth;
pub mod rejections;
pub mod services;
pub mod session;
pub mod statics;
pub mod storage;
pub mod utils;
pub mod views;
pub mod xml;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    db::Db,
    extractors::Format,
    oauth::OAuthClients,
    services::{attachments::AttachmentService, auth::AuthService, random_play::RandomPlayService},
    storage::Storage,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub auth: AuthService,
    pub storage: Storage,
    pub oauth: Arc<OAuthClients>,
    pub config: Arc<config::Config>,
}

impl AppState {
    pub fn new(db: Db, storage: Storage, config: config::Config) -> Self {
        Self {
            auth: AuthService::new(db.clone()),
            oauth: Arc::new(OAuthClients::from_config(&config)),
            config: Arc::new(config),
            storage,
            db,
        }
    }

    pub fn attachments(&self) -> AttachmentService {
        AttachmentService::new(self.db.clone(), self.storage.clone())
    }

    pub fn random_play(&self) -> RandomPlayService {
        RandomPlayService::new(self.db.clone())
    }
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.uploads_dir);

    let app = Router::new()
        .merge(handlers::homepage::routes())
        .merge(handlers::session::routes())
        .merge(handlers::users::routes())
        .merge(handlers::quizzes::routes())
        .merge(handlers::favourites::routes())
        .merge(handlers::random_play::routes())
        .nest("/api", handlers::api::routes(state.clone()))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_layer,
        ))
        .nest_service("/static", statics::routes())
        .nest_service("/uploads", uploads)
        .with_state(state);

    // Rewrites must happen before routing, so they wrap the whole app.
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn(rewrite_request))
        .layer(TraceLayer::new_for_http())
}

#[derive(Deserialize)]
struct MethodOverride {
    #[serde(rename = "_method")]
    method: Option<String>,
}

/// Applies `?_method=` overrides on POST requests and strips an API format
/// suffix (`/api/quizzes.xml`) from the path, recording it as [`Format`].
async fn rewrite_request(mut req: Request, next: Next) -> Response {
    if req.method() == Method::POST {
        let overridden = axum::extract::Query::<MethodOverride>::try_from_uri(req.uri())
            .ok()
            .and_then(|q| q.0.method)
            .and_then(|m| match m.to_ascii_uppercase().as_str() {
                "PUT" => Some(Method::PUT),
                "PATCH" => Some(Method::PATCH),
                "DELETE" => Some(Method::DELETE),
                _ => None,
            });
        if let Some(method) = overridden {
            *req.method_mut() = method;
        }
    }

    if req.uri().path().starts_with(names::API_PREFIX) {
        match split_format_suffix(req.uri()) {
            Ok(Some((uri, format))) => {
                *req.uri_mut() = uri;
                req.extensions_mut().insert(format);
            }
            Ok(None) => {
                req.extensions_mut().insert(Format::Json);
            }
            Err(ext) => {
                tracing::debug!("unsupported API format {ext:?}");
                return (
                    StatusCode::NOT_ACCEPTABLE,
                    axum::Json(serde_json::json!({ "error": format!("No supported format .{ext}") })),
                )
                    .into_response();
            }
        }
    }

    next.run(req).await
}

/// Returns the URI without its `.json`/`.xml` suffix, `Ok(None)` when the
/// last segment has no suffix, or the unknown extension.
fn split_format_suffix(uri: &Uri) -> Result<Option<(Uri, Format)>, String> {
    let path = uri.path();
    let last = path.rsplit('/').next().unwrap_or_default();
    let Some((_, ext)) = last.rsplit_once('.') else {
        return Ok(None);
    };

    let format = match ext.to_ascii_lowercase().as_str() {
        "json" => Format::Json,
        "xml" => Format::Xml,
        _ => return Err(ext.to_string()),
    };

    let stripped = &path[..path.len() - ext.len() - 1];
    let rebuilt = match uri.query() {
        Some(query) => format!("{stripped}?{query}"),
        None => stripped.to_string(),
    };

    rebuilt
        .parse::<Uri>()
        .map(|uri| Some((uri, format)))
        .map_err(|_| ext.to_string())
}
