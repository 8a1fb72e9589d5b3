use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use maud::Markup;
use serde::Deserialize;

use crate::{
    extractors::PageCtx,
    names,
    rejections::{AppError, ResultExt},
    services::random_play::{CheckOutcome, NextOutcome},
    views::{self, random_play as play_views},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::RANDOM_PLAY_URL, get(play))
        .route("/quizzes/randomcheck/{quiz_id}", get(check))
}

async fn play(State(state): State<AppState>, ctx: PageCtx) -> Result<Markup, AppError> {
    let mut run = ctx.session.random_play();
    let outcome = state
        .random_play()
        .next(&mut run, ctx.user_id())
        .await
        .reject("could not pick a quiz")?;
    ctx.session.set_random_play(run);

    let body = match outcome {
        NextOutcome::Quiz { quiz, score } => play_views::play(&quiz, score),
        NextOutcome::NoMore { score } => play_views::no_more(score),
    };
    Ok(views::render(&ctx, "Random play", body))
}

#[derive(Deserialize)]
struct CheckQuery {
    #[serde(default)]
    answer: String,
}

async fn check(
    State(state): State<AppState>,
    ctx: PageCtx,
    Path(quiz_id): Path<i64>,
    Query(query): Query<CheckQuery>,
) -> Result<Markup, AppError> {
    let mut run = ctx.session.random_play();
    let outcome = state
        .random_play()
        .check(&mut run, Some(quiz_id), &query.answer, ctx.user_id())
        .await
        .reject("could not check the answer")?;
    ctx.session.set_random_play(run);

    match outcome {
        CheckOutcome::Checked(result) => Ok(views::render(
            &ctx,
            "Random play",
            play_views::result(&result),
        )),
        CheckOutcome::NotPlaying => Err(AppError::Conflict("No quiz is awaiting an answer")),
        CheckOutcome::QuizGone => Err(AppError::NotFound("Quiz not found")),
    }
}
