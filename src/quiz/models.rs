//! Quiz configuration and results

use serde::{Deserialize, Serialize};

use crate::bank::{Category, Difficulty};

/// Questions per quiz when nothing else is configured
pub const DEFAULT_QUIZ_COUNT: usize = 10;

/// How a quiz pool is drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    /// Lesion keys to draw from; empty means every lesion
    #[serde(default)]
    pub lesions: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub count: usize,
    /// Time limit in minutes, 0 for an untimed quiz
    #[serde(default)]
    pub timer_minutes: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            lesions: Vec::new(),
            category: None,
            difficulty: None,
            count: DEFAULT_QUIZ_COUNT,
            timer_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    Answered,
    TimedOut,
    Skipped,
}

/// One question's result within a quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub question_id: String,
    pub correct: bool,
    #[serde(default)]
    pub selected: Vec<String>,
    pub outcome: ResponseOutcome,
}

/// Score for one lesion, in first-appearance order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LesionScore {
    pub label: String,
    pub key: String,
    pub correct: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    pub correct: usize,
    pub total: usize,
    /// The quiz ended because its timer ran out
    pub timed_out: bool,
    pub elapsed_seconds: i64,
    pub responses: Vec<QuizResponse>,
    pub breakdown: Vec<LesionScore>,
    pub flagged: Vec<String>,
}

impl QuizResults {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Format seconds as `MM:SS`
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
