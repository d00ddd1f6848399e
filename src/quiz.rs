//! Quiz scoring engine.
//!
//! A quiz session moves `Answering -> Scored` only when every question has a
//! real answer AND the attempt row has been persisted. A blocked submission
//! names the first unanswered question (1-based) as a dismissible warning;
//! a failed persist leaves the session in `Answering` with all selections
//! intact so the user can retry without re-answering.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::QuizQuestion;

/// Sentinel for an unanswered question.
pub const UNANSWERED: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub enum QuizState {
    Answering,
    Scored(f64),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizGate {
    #[error("Question {0} has not been answered")]
    Unanswered(usize),
    #[error("Expected {expected} answers, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// Lowest 1-based index still holding the sentinel, if any.
pub fn first_unanswered(answers: &[i32]) -> Option<usize> {
    answers
        .iter()
        .position(|answer| *answer == UNANSWERED)
        .map(|index| index + 1)
}

/// Validates the answer sheet and computes the score. Never partial: any
/// sentinel blocks scoring with the first offending question.
pub fn evaluate(answers: &[i32], questions: &[QuizQuestion]) -> Result<f64, QuizGate> {
    if answers.len() != questions.len() {
        return Err(QuizGate::WrongLength {
            expected: questions.len(),
            got: answers.len(),
        });
    }

    if let Some(question_number) = first_unanswered(answers) {
        return Err(QuizGate::Unanswered(question_number));
    }

    let correct = answers
        .iter()
        .zip(questions)
        .filter(|(answer, question)| **answer == question.correct_answer as i32)
        .count();

    Ok((correct as f64 / questions.len() as f64) * 100.0)
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    answers: Vec<i32>,
    state: QuizState,
}

impl QuizSession {
    pub fn new(question_count: usize) -> Self {
        Self {
            answers: vec![UNANSWERED; question_count],
            state: QuizState::Answering,
        }
    }

    /// Rebuilds a session from a submitted answer sheet, still in
    /// `Answering`. The length gate in [`evaluate`] applies on submit.
    pub fn from_answers(answers: Vec<i32>) -> Self {
        Self {
            answers,
            state: QuizState::Answering,
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn answers(&self) -> &[i32] {
        &self.answers
    }

    pub fn select(&mut self, question_index: usize, option: i32) {
        if let Some(slot) = self.answers.get_mut(question_index) {
            *slot = option;
        }
    }

    /// Computes the score without leaving `Answering`; the caller transitions
    /// via [`QuizSession::mark_scored`] once the attempt has been persisted.
    pub fn submit(&self, questions: &[QuizQuestion]) -> Result<f64, QuizGate> {
        evaluate(&self.answers, questions)
    }

    pub fn mark_scored(&mut self, score: f64) {
        self.state = QuizState::Scored(score);
    }

    /// Retake: back to `Answering` with every answer reset to the sentinel.
    /// Persisted attempts are untouched.
    pub fn reset(&mut self) {
        self.answers.fill(UNANSWERED);
        self.state = QuizState::Answering;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: i64,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbQuizAttempt {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub score: Option<f64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbQuizAttempt> for QuizAttempt {
    fn from(db: DbQuizAttempt) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            user_id: db.user_id.unwrap_or_default(),
            score: db.score.unwrap_or_default(),
            created_at: db
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}
