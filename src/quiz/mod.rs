//! Timed and untimed quizzes over the merged bank

mod models;
mod pool;
mod session;

use thiserror::Error;

pub use models::*;
pub use pool::{build_quiz_pool, missed_pool};
pub use session::QuizSession;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("The quiz has no questions left")]
    Finished,

    #[error("Select an answer before submitting")]
    NoSelection,
}

pub type Result<T> = std::result::Result<T, QuizError>;
