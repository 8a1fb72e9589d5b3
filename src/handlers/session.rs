use axum::{
    extract::{Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::{
    extractors::PageCtx,
    handlers::go_back,
    names,
    oauth::Provider,
    rejections::{AppError, OptionExt, ResultExt},
    services::auth::LoginOutcome,
    session::{FlashKind, PendingOAuth, Session},
    views, AppState,
};

use crate::views::session as session_views;

const LOGIN_FAILED: &str = "Authentication has failed. Retry it again.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            names::LOGIN_URL,
            get(login_page).post(login_post).delete(logout),
        )
        .route("/auth/{provider}", get(oauth_start))
        .route("/auth/{provider}/callback", get(oauth_callback))
}

async fn login_page(ctx: PageCtx) -> maud::Markup {
    views::render(&ctx, "Login", session_views::login(&ctx, ""))
}

#[derive(Deserialize)]
struct LoginPost {
    username: String,
    password: String,
}

async fn login_post(
    State(state): State<AppState>,
    ctx: PageCtx,
    Form(body): Form<LoginPost>,
) -> Result<Response, AppError> {
    let outcome = state
        .auth
        .login(&body.username, &body.password)
        .await
        .reject("could not log in")?;

    match outcome {
        LoginOutcome::Success(user) => {
            ctx.session.login(user.id);
            Ok(go_back().into_response())
        }
        LoginOutcome::InvalidCredentials => {
            ctx.session.flash(FlashKind::Error, LOGIN_FAILED);
            Ok(views::render(&ctx, "Login", session_views::login(&ctx, &body.username)).into_response())
        }
    }
}

async fn logout(session: Session) -> impl IntoResponse {
    session.logout();
    go_back()
}

fn configured_provider(state: &AppState, slug: &str) -> Result<Provider, AppError> {
    Provider::from_slug(slug)
        .filter(|p| state.oauth.get(*p).is_some())
        .or_not_found("Unknown login provider")
}

async fn oauth_start(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Redirect, AppError> {
    let provider = configured_provider(&state, &slug)?;
    let client = state.oauth.get(provider).or_not_found("Unknown login provider")?;

    let authorization = client
        .authorize()
        .reject("could not build the authorization URL")?;
    session.set_oauth(PendingOAuth {
        provider: provider.slug().to_string(),
        state: authorization.state,
        verifier: authorization.verifier,
    });

    Ok(Redirect::to(&authorization.url))
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let provider = configured_provider(&state, &slug)?;

    let failed = |reason: &str| {
        tracing::warn!("{} login failed: {reason}", provider.label());
        session.flash(FlashKind::Error, LOGIN_FAILED);
        Ok(Redirect::to(names::LOGIN_URL))
    };

    if let Some(error) = &query.error {
        return failed(error);
    }
    let pending = session.take_oauth();
    let Some(pending) = pending.filter(|p| p.provider == provider.slug()) else {
        return failed("no pending login");
    };
    if query.state.as_deref() != Some(pending.state.as_str()) {
        return failed("state mismatch");
    }
    let Some(code) = query.code.as_deref() else {
        return failed("missing code");
    };

    let profile = match state
        .oauth
        .exchange(provider, code, pending.verifier.as_deref())
        .await
    {
        Ok(profile) => profile,
        Err(e) => return failed(&e.to_string()),
    };

    let user = state
        .db
        .find_or_create_oauth_user(
            provider.account_type_id(),
            &profile.id,
            &profile.name,
            &profile.username(provider),
        )
        .await
        .reject("could not load the OAuth user")?;

    session.login(user.id);
    Ok(go_back())
}
