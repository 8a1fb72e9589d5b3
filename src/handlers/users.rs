use axum::{
    extract::{Multipart, Path, Query, State},
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    routing::{get, put},
    Router,
};
use maud::Markup;
use serde::Deserialize;

use crate::{
    db::models::{AuthUser, User},
    extractors::PageCtx,
    handlers::{flash_change, go_back, read_multipart, remember_back, upload_limit, PageWindow},
    names,
    rejections::{AppError, OptionExt, ResultExt},
    services::{
        attachments::Owner,
        auth::{RegisterOutcome, UpdatePasswordOutcome},
    },
    session::FlashKind,
    views::{self, users as user_views},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::USERS_URL, get(index).post(create).layer(upload_limit()))
        .route(names::NEW_USER_URL, get(new))
        .route(
            "/users/{id}",
            get(show).put(update).delete(destroy).layer(upload_limit()),
        )
        .route("/users/{id}/edit", get(edit))
        .route("/users/{id}/token", put(create_token))
}

#[derive(Deserialize)]
struct PageQuery {
    pageno: Option<i64>,
}

async fn index(
    State(state): State<AppState>,
    ctx: PageCtx,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<Markup, AppError> {
    ctx.require_user()?;
    remember_back(&ctx.session, &uri);

    let count = state.db.users_count().await.reject("could not count users")?;
    let window = PageWindow::clamped(query.pageno, count);
    let users = state
        .db
        .users(window.offset, Some(names::ITEMS_PER_PAGE))
        .await
        .reject("could not list users")?;

    Ok(views::render(
        &ctx,
        "Users",
        user_views::index(&ctx, &users, window.pageno, window.total_pages),
    ))
}

async fn show(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(user_id): Path<i64>,
) -> Result<Markup, AppError> {
    ctx.require_user()?;
    let user = state
        .db
        .get_user(user_id)
        .await
        .reject("could not load user")?
        .or_not_found("User not found")?;

    Ok(views::render(&ctx, &user.username, user_views::show(&ctx, &user)))
}

async fn new(ctx: PageCtx) -> Result<Markup, AppError> {
    if !ctx.can_register() {
        return Err(AppError::Forbidden);
    }
    Ok(views::render(&ctx, "New user", user_views::new("", None)))
}

async fn create(
    State(state): State<AppState>,
    ctx: PageCtx,
    multipart: Multipart,
) -> Result<Response, AppError> {
    if !ctx.can_register() {
        return Err(AppError::Forbidden);
    }
    let form = read_multipart(multipart, "photo").await?;

    let outcome = state
        .auth
        .register(form.text("username"), form.text("password"), false)
        .await
        .reject("could not create user")?;
    let user_id = match outcome {
        RegisterOutcome::Created(user_id) => user_id,
        rejected => {
            let message = rejected.message().unwrap_or_default();
            let body = user_views::new(form.text("username"), Some(message.as_str()));
            return Ok(views::render(&ctx, "New user", body).into_response());
        }
    };

    if let Some(photo) = &form.file {
        match state.attachments().attach(Owner::User(user_id), photo).await {
            Ok(_) => ctx.session.flash(FlashKind::Success, "Photo saved successfully."),
            Err(e) => {
                tracing::warn!("could not save photo of user {user_id}: {e}");
                ctx.session.flash(FlashKind::Error, "Photo could not be saved.");
            }
        }
    }
    ctx.session.flash(FlashKind::Success, "User created successfully.");

    let target = match ctx.user {
        Some(_) => names::user_url(user_id),
        None => names::LOGIN_URL.to_string(),
    };
    Ok(Redirect::to(&target).into_response())
}

/// Loads a user the viewer may manage: themselves, or anyone for admins.
async fn managed_user(state: &AppState, viewer: &AuthUser, user_id: i64) -> Result<User, AppError> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .reject("could not load user")?
        .or_not_found("User not found")?;
    if !viewer.can_manage(Some(user.id)) {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

async fn edit(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(user_id): Path<i64>,
) -> Result<Markup, AppError> {
    let user = managed_user(&state, ctx.require_user()?, user_id).await?;
    if !user.is_local() {
        return Err(AppError::Forbidden);
    }

    Ok(views::render(&ctx, "Edit user", user_views::edit(&user)))
}

async fn update(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(user_id): Path<i64>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let user = managed_user(&state, ctx.require_user()?, user_id).await?;
    let mut form = read_multipart(multipart, "photo").await?;

    match state
        .auth
        .update_password(&user, form.text("password"))
        .await
        .reject("could not update password")?
    {
        UpdatePasswordOutcome::NotLocal => return Err(AppError::Forbidden),
        UpdatePasswordOutcome::Updated | UpdatePasswordOutcome::Unchanged => {}
    }

    let outcome = state
        .attachments()
        .change(Owner::User(user.id), user.photo.as_ref(), form.attachment_change("keep_photo"))
        .await
        .reject("could not update photo")?;
    flash_change(&ctx.session, &outcome, "Photo");

    ctx.session.flash(FlashKind::Success, "User updated successfully.");
    Ok(Redirect::to(&names::user_url(user.id)))
}

async fn destroy(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(user_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let viewer = ctx.require_user()?;
    let user = managed_user(&state, viewer, user_id).await?;

    let storage_ok = state
        .attachments()
        .delete_owner(Owner::User(user.id), user.photo.as_ref())
        .await
        .reject("could not delete user")?;
    if !storage_ok {
        ctx.session.flash(FlashKind::Info, "The photo could not be deleted from storage.");
    }

    if viewer.id == user.id {
        ctx.session.logout();
    }
    ctx.session.flash(FlashKind::Success, "User deleted successfully.");
    Ok(go_back())
}

async fn create_token(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(user_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let user = managed_user(&state, ctx.require_user()?, user_id).await?;

    state
        .db
        .regenerate_token(user.id)
        .await
        .reject("could not create access token")?;

    ctx.session.flash(FlashKind::Success, "User Access Token created successfully.");
    Ok(Redirect::to(&names::user_url(user.id)))
}
