use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::users::ApiUser;
use crate::{
    db::models::{Media, Quiz},
    extractors::{Format, TokenOwner},
    handlers::{
        api::{reply, reply_list},
        ListQuery, PageWindow,
    },
    names,
    rejections::{ApiError, OptionExt, ResultExt},
    services::random_play::answers_match,
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quizzes", get(index))
        .route("/quizzes/random", get(random))
        .route("/quizzes/random10wa", get(random_with_answers))
        .route("/quizzes/{id}", get(show))
        .route("/quizzes/{id}/check", get(check))
        .route("/users/tokenOwner/quizzes", get(token_owner_index))
        .route("/users/{id}/quizzes", get(user_index))
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiQuiz {
    pub id: i64,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub author: Option<ApiUser>,
    pub attachment: Option<Media>,
    pub favourite: bool,
}

impl ApiQuiz {
    /// The public shape. Answers stay hidden.
    pub fn from_quiz(quiz: Quiz) -> Self {
        ApiQuiz {
            id: quiz.id,
            question: quiz.question,
            answer: None,
            author: quiz.author.map(ApiUser::from),
            attachment: quiz.attachment.as_ref().map(|a| a.media()),
            favourite: quiz.favourite,
        }
    }

    pub fn with_answer(quiz: Quiz) -> Self {
        let answer = quiz.answer.clone();
        ApiQuiz {
            answer: Some(answer),
            ..Self::from_quiz(quiz)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizPage {
    quizzes: Vec<ApiQuiz>,
    pageno: i64,
    /// Empty on the last page.
    next_url: String,
}

async fn index(
    State(state): State<AppState>,
    format: Format,
    uri: Uri,
    TokenOwner(owner): TokenOwner,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    page(&state, format, &uri, &query, None, owner.id).await
}

async fn user_index(
    State(state): State<AppState>,
    format: Format,
    uri: Uri,
    TokenOwner(owner): TokenOwner,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    state
        .db
        .get_auth_user(user_id)
        .await
        .reject("could not load user")?
        .or_not_found("User not found")?;
    page(&state, format, &uri, &query, Some(user_id), owner.id).await
}

async fn token_owner_index(
    State(state): State<AppState>,
    format: Format,
    uri: Uri,
    TokenOwner(owner): TokenOwner,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    page(&state, format, &uri, &query, Some(owner.id), owner.id).await
}

async fn page(
    state: &AppState,
    format: Format,
    uri: &Uri,
    query: &ListQuery,
    author_id: Option<i64>,
    viewer_id: i64,
) -> Result<Response, ApiError> {
    let filter = query.filter(author_id, Some(viewer_id));
    let count = state
        .db
        .count_quizzes(&filter)
        .await
        .reject("could not count quizzes")?;
    let window = PageWindow::unclamped(query.pageno, count);
    let quizzes = state
        .db
        .quizzes(&filter, Some(viewer_id), window.offset, names::ITEMS_PER_PAGE)
        .await
        .reject("could not list quizzes")?;

    let next_url = if window.pageno < window.total_pages {
        next_page_url(&state.config.base_url, uri, format, window.pageno + 1)
    } else {
        String::new()
    };

    let page = QuizPage {
        quizzes: quizzes.into_iter().map(ApiQuiz::from_quiz).collect(),
        pageno: window.pageno,
        next_url,
    };
    match format {
        Format::Json => reply(format, "quizzes", &page),
        // Keeps `<quiz>` as the repeated element name.
        Format::Xml => reply(
            format,
            "result",
            &serde_json::json!({
                "quizzes": { "quiz": page.quizzes },
                "pageno": page.pageno,
                "nextUrl": page.next_url,
            }),
        ),
    }
}

/// Absolute URL of another page of the same listing. `uri` is the path
/// inside the API, with the format suffix already stripped.
fn next_page_url(base_url: &str, uri: &Uri, format: Format, pageno: i64) -> String {
    let suffix = match format {
        Format::Json => "",
        Format::Xml => ".xml",
    };
    let url = match uri.query() {
        Some(query) => format!("{}/api{}{suffix}?{query}", base_url.trim_end_matches('/'), uri.path()),
        None => format!("{}/api{}{suffix}", base_url.trim_end_matches('/'), uri.path()),
    };
    utils::with_pageno(&url, pageno)
}

async fn show(
    State(state): State<AppState>,
    format: Format,
    TokenOwner(owner): TokenOwner,
    Path(quiz_id): Path<i64>,
) -> Result<Response, ApiError> {
    let quiz = state
        .db
        .get_quiz(quiz_id, Some(owner.id))
        .await
        .reject("could not load quiz")?
        .or_not_found("Quiz not found")?;
    reply(format, "quiz", &ApiQuiz::from_quiz(quiz))
}

#[derive(Deserialize)]
struct CheckQuery {
    #[serde(default)]
    answer: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReply {
    quiz_id: i64,
    answer: String,
    result: bool,
}

async fn check(
    State(state): State<AppState>,
    format: Format,
    Path(quiz_id): Path<i64>,
    Query(query): Query<CheckQuery>,
) -> Result<Response, ApiError> {
    let quiz = state
        .db
        .get_quiz(quiz_id, None)
        .await
        .reject("could not load quiz")?
        .or_not_found("Quiz not found")?;

    let result = answers_match(&query.answer, &quiz.answer);
    let check = CheckReply {
        quiz_id: quiz.id,
        answer: query.answer,
        result,
    };
    reply(format, "check", &check)
}

async fn random(
    State(state): State<AppState>,
    format: Format,
    TokenOwner(owner): TokenOwner,
) -> Result<Response, ApiError> {
    let quiz = state
        .random_play()
        .random_quiz(Some(owner.id))
        .await
        .reject("could not pick a quiz")?;

    match quiz {
        Some(quiz) => reply(format, "quiz", &ApiQuiz::from_quiz(quiz)),
        None => reply(format, "quiz", &serde_json::json!({ "nomore": true })),
    }
}

async fn random_with_answers(
    State(state): State<AppState>,
    format: Format,
    TokenOwner(owner): TokenOwner,
) -> Result<Response, ApiError> {
    let quizzes = state
        .random_play()
        .random_quizzes(names::RANDOM_BATCH_SIZE, Some(owner.id))
        .await
        .reject("could not pick quizzes")?;

    let quizzes: Vec<ApiQuiz> = quizzes.into_iter().map(ApiQuiz::with_answer).collect();
    reply_list(format, "quizzes", "quiz", &quizzes)
}
