use color_eyre::Result;
use rand::seq::{IteratorRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::db::models::Quiz;
use crate::db::Db;

/// Random-play progress, persisted in the browser session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum RandomPlay {
    #[default]
    NoSession,
    AwaitingAnswer {
        /// The quiz being played. `None` right after a correct answer.
        current: Option<i64>,
        /// Quizzes already answered correctly in this run.
        resolved: Vec<i64>,
    },
}

impl RandomPlay {
    pub fn current(&self) -> Option<i64> {
        match self {
            RandomPlay::AwaitingAnswer { current, .. } => *current,
            RandomPlay::NoSession => None,
        }
    }

    pub fn score(&self) -> usize {
        match self {
            RandomPlay::AwaitingAnswer { resolved, .. } => resolved.len(),
            RandomPlay::NoSession => 0,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait QuizSource: Send + Sync {
    fn quiz_ids(&self) -> impl std::future::Future<Output = Result<Vec<i64>>> + Send;

    fn find_quiz(
        &self,
        quiz_id: i64,
        viewer_id: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Option<Quiz>>> + Send;
}

impl QuizSource for Db {
    async fn quiz_ids(&self) -> Result<Vec<i64>> {
        Db::quiz_ids(self).await
    }

    async fn find_quiz(&self, quiz_id: i64, viewer_id: Option<i64>) -> Result<Option<Quiz>> {
        self.get_quiz(quiz_id, viewer_id).await
    }
}

pub enum NextOutcome {
    Quiz { quiz: Quiz, score: usize },
    /// Every quiz has been answered. The run is over.
    NoMore { score: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub quiz_id: i64,
    pub answer: String,
    pub result: bool,
    pub score: usize,
}

pub enum CheckOutcome {
    Checked(CheckResult),
    /// No quiz is awaiting an answer, or a different one is.
    NotPlaying,
    /// The quiz being played was deleted.
    QuizGone,
}

/// Case-insensitive comparison, ignoring surrounding whitespace.
pub fn answers_match(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

pub struct RandomPlayService<S: QuizSource = Db> {
    source: S,
}

impl<S: QuizSource + Clone> Clone for RandomPlayService<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<S: QuizSource> RandomPlayService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Starts a fresh run and serves its first quiz.
    pub async fn start(&self, state: &mut RandomPlay, viewer_id: Option<i64>) -> Result<NextOutcome> {
        *state = RandomPlay::AwaitingAnswer {
            current: None,
            resolved: Vec::new(),
        };
        self.next(state, viewer_id).await
    }

    /// Serves the quiz awaiting an answer, or picks a new unresolved one.
    pub async fn next(&self, state: &mut RandomPlay, viewer_id: Option<i64>) -> Result<NextOutcome> {
        let (current, resolved) = match std::mem::take(state) {
            RandomPlay::NoSession => (None, Vec::new()),
            RandomPlay::AwaitingAnswer { current, resolved } => (current, resolved),
        };
        let score = resolved.len();

        if let Some(quiz_id) = current {
            if let Some(quiz) = self.source.find_quiz(quiz_id, viewer_id).await? {
                *state = RandomPlay::AwaitingAnswer { current, resolved };
                return Ok(NextOutcome::Quiz { quiz, score });
            }
            tracing::debug!("quiz {quiz_id} vanished during random play, picking another");
        }

        let mut candidates: Vec<i64> = self
            .source
            .quiz_ids()
            .await?
            .into_iter()
            .filter(|id| !resolved.contains(id))
            .collect();
        candidates.shuffle(&mut rand::thread_rng());

        for quiz_id in candidates {
            if let Some(quiz) = self.source.find_quiz(quiz_id, viewer_id).await? {
                *state = RandomPlay::AwaitingAnswer {
                    current: Some(quiz_id),
                    resolved,
                };
                return Ok(NextOutcome::Quiz { quiz, score });
            }
        }

        // Left as NoSession by the take above.
        Ok(NextOutcome::NoMore { score })
    }

    /// Checks `answer` against the quiz awaiting one. When `quiz_id` is given
    /// it must name that quiz. A wrong answer ends the run.
    pub async fn check(
        &self,
        state: &mut RandomPlay,
        quiz_id: Option<i64>,
        answer: &str,
        viewer_id: Option<i64>,
    ) -> Result<CheckOutcome> {
        let Some(current) = state.current() else {
            return Ok(CheckOutcome::NotPlaying);
        };
        if quiz_id.is_some_and(|id| id != current) {
            return Ok(CheckOutcome::NotPlaying);
        }

        let Some(quiz) = self.source.find_quiz(current, viewer_id).await? else {
            if let RandomPlay::AwaitingAnswer { current, .. } = state {
                *current = None;
            }
            return Ok(CheckOutcome::QuizGone);
        };

        let result = answers_match(answer, &quiz.answer);
        let score = match state {
            RandomPlay::AwaitingAnswer { current, resolved } if result => {
                if !resolved.contains(&quiz.id) {
                    resolved.push(quiz.id);
                }
                *current = None;
                resolved.len()
            }
            _ => {
                let score = state.score();
                *state = RandomPlay::NoSession;
                score
            }
        };

        Ok(CheckOutcome::Checked(CheckResult {
            quiz_id: quiz.id,
            answer: answer.to_string(),
            result,
            score,
        }))
    }

    /// One uniformly random quiz, outside of any run.
    pub async fn random_quiz(&self, viewer_id: Option<i64>) -> Result<Option<Quiz>> {
        Ok(self.random_quizzes(1, viewer_id).await?.into_iter().next())
    }

    /// Up to `count` distinct random quizzes.
    pub async fn random_quizzes(&self, count: usize, viewer_id: Option<i64>) -> Result<Vec<Quiz>> {
        let ids = self.source.quiz_ids().await?;
        let picked = ids.into_iter().choose_multiple(&mut rand::thread_rng(), count);

        let mut quizzes = Vec::with_capacity(picked.len());
        for quiz_id in picked {
            if let Some(quiz) = self.source.find_quiz(quiz_id, viewer_id).await? {
                quizzes.push(quiz);
            }
        }
        Ok(quizzes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
