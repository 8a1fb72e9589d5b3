use axum::{
    http::Uri,
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};

use crate::{extractors::PageCtx, handlers::remember_back, session::Session, views, AppState};

use crate::views::homepage as homepage_views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(homepage))
        .route("/author", get(author))
        .route("/goback", get(go_back))
}

async fn homepage(ctx: PageCtx, uri: Uri) -> maud::Markup {
    remember_back(&ctx.session, &uri);
    views::render(&ctx, "Home", homepage_views::index(&ctx))
}

async fn author(ctx: PageCtx, uri: Uri) -> maud::Markup {
    remember_back(&ctx.session, &uri);
    views::render(&ctx, "Author", homepage_views::author())
}

/// Redirects to the saved restoration URL, once.
async fn go_back(session: Session) -> impl IntoResponse {
    let url = session.take_back_url().unwrap_or_else(|| "/".to_string());
    Redirect::to(&url)
}
