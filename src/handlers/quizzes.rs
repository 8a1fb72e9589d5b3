use axum::{
    extract::{Multipart, Path, Query, State},
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use maud::Markup;
use serde::Deserialize;

use crate::{
    db::models::{AuthUser, Quiz},
    extractors::PageCtx,
    handlers::{
        flash_change, go_back, read_multipart, remember_back, upload_limit, FormData, ListQuery,
        PageWindow,
    },
    names,
    rejections::{AppError, OptionExt, ResultExt},
    services::{attachments::Owner, random_play::answers_match},
    session::FlashKind,
    views::{
        self,
        quizzes::{self as quiz_views, Listing, QuizForm, Search},
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::QUIZZES_URL, get(index).post(create).layer(upload_limit()))
        .route(names::NEW_QUIZ_URL, get(new))
        .route(
            "/quizzes/{id}",
            get(show).put(update).delete(destroy).layer(upload_limit()),
        )
        .route("/quizzes/{id}/edit", get(edit))
        .route("/quizzes/{id}/play", get(play))
        .route("/quizzes/{id}/check", get(check))
        .route("/users/{id}/quizzes", get(user_index))
}

async fn index(
    State(state): State<AppState>,
    ctx: PageCtx,
    uri: Uri,
    Query(query): Query<ListQuery>,
) -> Result<Markup, AppError> {
    listing(&state, &ctx, &uri, &query, None, "Quizzes").await
}

async fn user_index(
    State(state): State<AppState>,
    ctx: PageCtx,
    uri: Uri,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Markup, AppError> {
    ctx.require_user()?;
    let author = state
        .db
        .get_user(user_id)
        .await
        .reject("could not load user")?
        .or_not_found("User not found")?;

    let title = format!("Quizzes by {}", author.username);
    listing(&state, &ctx, &uri, &query, Some(author.id), &title).await
}

async fn listing(
    state: &AppState,
    ctx: &PageCtx,
    uri: &Uri,
    query: &ListQuery,
    author_id: Option<i64>,
    title: &str,
) -> Result<Markup, AppError> {
    remember_back(&ctx.session, uri);

    let filter = query.filter(author_id, ctx.user_id());
    let count = state
        .db
        .count_quizzes(&filter)
        .await
        .reject("could not count quizzes")?;
    let window = PageWindow::clamped(query.pageno, count);
    let quizzes = state
        .db
        .quizzes(&filter, ctx.user_id(), window.offset, names::ITEMS_PER_PAGE)
        .await
        .reject("could not list quizzes")?;

    let url = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    let body = quiz_views::index(
        ctx,
        &quizzes,
        Search {
            text: query.search.as_deref().unwrap_or_default(),
            favourites: filter.favourites_of.is_some(),
        },
        Listing {
            title,
            url,
            pageno: window.pageno,
            total_pages: window.total_pages,
        },
    );
    Ok(views::render(ctx, title, body))
}

async fn find_quiz(state: &AppState, quiz_id: i64, viewer_id: Option<i64>) -> Result<Quiz, AppError> {
    state
        .db
        .get_quiz(quiz_id, viewer_id)
        .await
        .reject("could not load quiz")?
        .or_not_found("Quiz not found")
}

/// Loads a quiz the viewer may manage: their own, or any for admins.
async fn managed_quiz(state: &AppState, viewer: &AuthUser, quiz_id: i64) -> Result<Quiz, AppError> {
    let quiz = find_quiz(state, quiz_id, Some(viewer.id)).await?;
    if !viewer.can_manage(quiz.author_id()) {
        return Err(AppError::Forbidden);
    }
    Ok(quiz)
}

/// Reads and validates the question and answer of a submitted form.
fn quiz_form(form: &FormData) -> QuizForm {
    let question = form.text("question").trim().to_string();
    let answer = form.text("answer").trim().to_string();
    QuizForm {
        question_error: question.is_empty().then_some("Question must not be empty."),
        answer_error: answer.is_empty().then_some("Answer must not be empty."),
        question,
        answer,
    }
}

async fn show(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
) -> Result<Markup, AppError> {
    let quiz = managed_quiz(&state, ctx.require_user()?, quiz_id).await?;
    Ok(views::render(&ctx, "Quiz", quiz_views::show(&quiz)))
}

async fn new(ctx: PageCtx) -> Result<Markup, AppError> {
    ctx.require_user()?;
    Ok(views::render(&ctx, "New quiz", quiz_views::new(&QuizForm::default())))
}

async fn create(
    State(state): State<AppState>,
    ctx: PageCtx,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let author = ctx.require_user()?;

    let since = Utc::now() - Duration::hours(24);
    let recent = state
        .db
        .quizzes_created_since(author.id, since)
        .await
        .reject("could not count recent quizzes")?;
    if recent >= names::QUIZZES_PER_DAY {
        tracing::info!("user {} hit the daily quiz limit", author.id);
        ctx.session.flash(
            FlashKind::Error,
            format!("You can not create more than {} quizzes per day.", names::QUIZZES_PER_DAY),
        );
        return Ok(Redirect::to(names::QUIZZES_URL).into_response());
    }

    let form = read_multipart(multipart, "image").await?;
    let fields = quiz_form(&form);
    if fields.has_errors() {
        return Ok(views::render(&ctx, "New quiz", quiz_views::new(&fields)).into_response());
    }

    let quiz_id = state
        .db
        .create_quiz(author.id, &fields.question, &fields.answer)
        .await
        .reject("could not create quiz")?;

    if let Some(image) = &form.file {
        if let Err(e) = state.attachments().attach(Owner::Quiz(quiz_id), image).await {
            tracing::warn!("could not save attachment of quiz {quiz_id}: {e}");
            ctx.session.flash(FlashKind::Error, "Attachment could not be saved.");
        }
    }

    ctx.session.flash(FlashKind::Success, "Quiz created successfully.");
    Ok(Redirect::to(&names::quiz_url(quiz_id)).into_response())
}

async fn edit(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
) -> Result<Markup, AppError> {
    let quiz = managed_quiz(&state, ctx.require_user()?, quiz_id).await?;
    let form = QuizForm {
        question: quiz.question.clone(),
        answer: quiz.answer.clone(),
        ..QuizForm::default()
    };
    Ok(views::render(&ctx, "Edit quiz", quiz_views::edit(&quiz, &form)))
}

async fn update(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let quiz = managed_quiz(&state, ctx.require_user()?, quiz_id).await?;
    let mut form = read_multipart(multipart, "image").await?;

    let fields = quiz_form(&form);
    if fields.has_errors() {
        return Ok(views::render(&ctx, "Edit quiz", quiz_views::edit(&quiz, &fields)).into_response());
    }

    state
        .db
        .update_quiz(quiz.id, &fields.question, &fields.answer)
        .await
        .reject("could not update quiz")?;

    let outcome = state
        .attachments()
        .change(Owner::Quiz(quiz.id), quiz.attachment.as_ref(), form.attachment_change("keep_image"))
        .await
        .reject("could not update attachment")?;
    flash_change(&ctx.session, &outcome, "Attachment");

    ctx.session.flash(FlashKind::Success, "Quiz edited successfully.");
    Ok(Redirect::to(&names::quiz_url(quiz.id)).into_response())
}

async fn destroy(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let quiz = managed_quiz(&state, ctx.require_user()?, quiz_id).await?;

    let storage_ok = state
        .attachments()
        .delete_owner(Owner::Quiz(quiz.id), quiz.attachment.as_ref())
        .await
        .reject("could not delete quiz")?;
    if !storage_ok {
        ctx.session.flash(FlashKind::Info, "The attachment could not be deleted from storage.");
    }

    ctx.session.flash(FlashKind::Success, "Quiz deleted successfully.");
    Ok(go_back())
}

#[derive(Deserialize)]
struct AnswerQuery {
    answer: Option<String>,
}

async fn play(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
    Query(query): Query<AnswerQuery>,
) -> Result<Markup, AppError> {
    let quiz = find_quiz(&state, quiz_id, ctx.user_id()).await?;
    let answer = query.answer.unwrap_or_default();
    Ok(views::render(&ctx, "Play", quiz_views::play(&quiz, &answer)))
}

async fn check(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
    Query(query): Query<AnswerQuery>,
) -> Result<Markup, AppError> {
    let quiz = find_quiz(&state, quiz_id, ctx.user_id()).await?;
    let answer = query.answer.unwrap_or_default();
    let result = answers_match(&answer, &quiz.answer);
    Ok(views::render(&ctx, "Result", quiz_views::check(&quiz, &answer, result)))
}
