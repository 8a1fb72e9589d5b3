//! Random play over the API. The run lives in the cookie session, like the
//! HTML pages, so clients must carry the session cookie between calls.

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::quizzes::ApiQuiz;
use crate::{
    extractors::{Format, TokenOwner},
    handlers::api::reply,
    rejections::{ApiError, AppError, ResultExt},
    services::random_play::{CheckOutcome, NextOutcome},
    session::Session,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quizzes/randomPlay/new", get(start))
        .route("/quizzes/randomPlay/next", get(next))
        .route("/quizzes/randomPlay/check", get(check))
}

#[derive(Serialize)]
#[serde(untagged)]
enum NextReply {
    Quiz { quiz: ApiQuiz, score: usize },
    NoMore { nomore: bool, score: usize },
}

impl From<NextOutcome> for NextReply {
    fn from(outcome: NextOutcome) -> Self {
        match outcome {
            NextOutcome::Quiz { quiz, score } => NextReply::Quiz {
                quiz: ApiQuiz::from_quiz(quiz),
                score,
            },
            NextOutcome::NoMore { score } => NextReply::NoMore {
                nomore: true,
                score,
            },
        }
    }
}

async fn start(
    State(state): State<AppState>,
    format: Format,
    session: Session,
    TokenOwner(owner): TokenOwner,
) -> Result<Response, ApiError> {
    let mut run = session.random_play();
    let outcome = state
        .random_play()
        .start(&mut run, Some(owner.id))
        .await
        .reject("could not start random play")?;
    session.set_random_play(run);

    reply(format, "randomPlay", &NextReply::from(outcome))
}

async fn next(
    State(state): State<AppState>,
    format: Format,
    session: Session,
    TokenOwner(owner): TokenOwner,
) -> Result<Response, ApiError> {
    let mut run = session.random_play();
    let outcome = state
        .random_play()
        .next(&mut run, Some(owner.id))
        .await
        .reject("could not pick a quiz")?;
    session.set_random_play(run);

    reply(format, "randomPlay", &NextReply::from(outcome))
}

#[derive(Deserialize)]
struct CheckQuery {
    #[serde(default)]
    answer: String,
}

async fn check(
    State(state): State<AppState>,
    format: Format,
    session: Session,
    TokenOwner(owner): TokenOwner,
    Query(query): Query<CheckQuery>,
) -> Result<Response, ApiError> {
    let mut run = session.random_play();
    let outcome = state
        .random_play()
        .check(&mut run, None, &query.answer, Some(owner.id))
        .await
        .reject("could not check the answer")?;
    session.set_random_play(run);

    match outcome {
        CheckOutcome::Checked(result) => reply(format, "check", &result),
        CheckOutcome::NotPlaying => Err(AppError::Conflict("No quiz is awaiting an answer").into()),
        CheckOutcome::QuizGone => Err(AppError::NotFound("Quiz not found").into()),
    }
}
