//! Review session controller
//!
//! Walks the due queue one question at a time:
//! `Idle -> Presenting -> (rationale shown) -> Graded -> Idle`, ending in
//! `Empty` once nothing is left to review. Cards never carry correctness
//! flags; the learner grades themselves after looking at the rationale.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::algorithm::preview_intervals;
use super::models::{ReviewItem, ReviewUpdate};
use crate::bank::{Category, Classification, Question};
use crate::context::StudyContext;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No question is being presented")]
    NothingPresented,

    #[error("Question '{0}' has not been graded yet")]
    CardInProgress(String),

    #[error("Quality must be between 0 and 5, got {0}")]
    InvalidQuality(u8),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// An answer choice as shown during review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedOption {
    pub key: String,
    pub text: String,
}

/// What the learner sees before grading
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub question_id: String,
    pub lesion_group: String,
    pub classification: Classification,
    pub category: Category,
    pub prompt: String,
    pub options: Vec<PresentedOption>,
    /// False when nothing was due and the earliest item was picked instead
    pub due_now: bool,
    pub repetition: u32,
    /// Interval each quality 0-5 would schedule
    pub intervals: [u32; 6],
}

impl ReviewCard {
    fn new(question: &Question, item: &ReviewItem, now: DateTime<Utc>) -> Self {
        Self {
            question_id: question.id.clone(),
            lesion_group: question.lesion_group.clone(),
            classification: question.classification,
            category: question.category,
            prompt: question.prompt.clone(),
            options: question
                .options
                .iter()
                .map(|o| PresentedOption {
                    key: o.key.clone(),
                    text: o.text.clone(),
                })
                .collect(),
            due_now: item.is_due(now),
            repetition: item.repetition,
            intervals: preview_intervals(item, now),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Presenting {
        card: ReviewCard,
        /// Filled once the learner asks for it
        rationale: Option<String>,
    },
    Graded {
        question_id: String,
        quality: u8,
        update: ReviewUpdate,
    },
    /// The review map has no live items
    Empty,
}

#[derive(Debug)]
pub struct ReviewSession {
    state: SessionState,
    current: Option<Question>,
    reviewed: usize,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            current: None,
            reviewed: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Questions graded in this session
    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    /// Present the next question in the queue
    pub fn next(&mut self, ctx: &mut StudyContext) -> Result<&SessionState> {
        self.next_at(ctx, Utc::now())
    }

    pub fn next_at(&mut self, ctx: &mut StudyContext, now: DateTime<Utc>) -> Result<&SessionState> {
        if let SessionState::Presenting { card, .. } = &self.state {
            return Err(SessionError::CardInProgress(card.question_id.clone()));
        }

        let next = ctx.load_next_review_at(now).and_then(|id| {
            let question = ctx.question(&id)?.clone();
            let item = ctx.review().get(&id)?.clone();
            Some((question, item))
        });

        match next {
            Some((question, item)) => {
                self.state = SessionState::Presenting {
                    card: ReviewCard::new(&question, &item, now),
                    rationale: None,
                };
                self.current = Some(question);
            }
            None => {
                self.state = SessionState::Empty;
                self.current = None;
            }
        }

        Ok(&self.state)
    }

    /// Reveal the rationale for the presented question
    pub fn show_rationale(&mut self) -> Result<&str> {
        let question = self.current.as_ref().ok_or(SessionError::NothingPresented)?;
        match &mut self.state {
            SessionState::Presenting { rationale, .. } => {
                Ok(rationale.get_or_insert_with(|| question.rationale.clone()).as_str())
            }
            _ => Err(SessionError::NothingPresented),
        }
    }

    /// Self-grade the presented question and reschedule it
    pub fn grade(&mut self, ctx: &mut StudyContext, quality: u8) -> Result<ReviewUpdate> {
        self.grade_at(ctx, quality, Utc::now())
    }

    pub fn grade_at(&mut self, ctx: &mut StudyContext, quality: u8, now: DateTime<Utc>) -> Result<ReviewUpdate> {
        if quality > 5 {
            return Err(SessionError::InvalidQuality(quality));
        }
        let SessionState::Presenting { card, .. } = &self.state else {
            return Err(SessionError::NothingPresented);
        };

        let question_id = card.question_id.clone();
        let update = ctx.update_review_item_at(&question_id, quality, now);
        self.reviewed += 1;
        self.current = None;
        self.state = SessionState::Graded {
            question_id,
            quality,
            update: update.clone(),
        };

        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{context_with, t0};
    use chrono::Duration;

    #[test]
    fn test_empty_queue() {
        let mut ctx = context_with(&["Q1"]);
        let mut session = ReviewSession::new();

        assert_eq!(session.next_at(&mut ctx, t0()).unwrap(), &SessionState::Empty);
        assert_eq!(session.show_rationale(), Err(SessionError::NothingPresented));
    }

    #[test]
    fn test_full_cycle() {
        let mut ctx = context_with(&["Q1", "Q2"]);
        ctx.enqueue_for_review_at("Q1", false, t0());
        let mut session = ReviewSession::new();

        let SessionState::Presenting { card, rationale } = session.next_at(&mut ctx, t0()).unwrap() else {
            panic!("expected a card");
        };
        assert_eq!(card.question_id, "Q1");
        assert!(card.due_now);
        assert_eq!(card.options.len(), 2);
        assert_eq!(card.intervals, [1, 1, 1, 1, 1, 1]);
        assert!(rationale.is_none());

        assert_eq!(session.show_rationale().unwrap(), "Pressure is higher on the left.");
        // Showing it again is allowed
        assert!(session.show_rationale().is_ok());

        let update = session.grade_at(&mut ctx, 4, t0()).unwrap();
        let ReviewUpdate::Scheduled(item) = update else {
            panic!("expected a scheduled item");
        };
        assert_eq!(item.interval, 1);
        assert_eq!(session.reviewed(), 1);

        // Only item is now scheduled for tomorrow, still offered as the earliest
        let SessionState::Presenting { card, .. } = session.next_at(&mut ctx, t0()).unwrap() else {
            panic!("expected a card");
        };
        assert!(!card.due_now);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut ctx = context_with(&["Q1"]);
        let mut session = ReviewSession::new();

        assert_eq!(
            session.grade_at(&mut ctx, 3, t0()).unwrap_err(),
            SessionError::NothingPresented
        );

        ctx.enqueue_for_review_at("Q1", false, t0());
        session.next_at(&mut ctx, t0()).unwrap();
        assert_eq!(
            session.next_at(&mut ctx, t0()).unwrap_err(),
            SessionError::CardInProgress("Q1".to_string())
        );
        assert_eq!(
            session.grade_at(&mut ctx, 6, t0()).unwrap_err(),
            SessionError::InvalidQuality(6)
        );
    }

    #[test]
    fn test_card_hides_correct_answers() {
        let mut ctx = context_with(&["Q1"]);
        ctx.enqueue_for_review_at("Q1", false, t0());
        let mut session = ReviewSession::new();

        let SessionState::Presenting { card, .. } = session.next_at(&mut ctx, t0()).unwrap() else {
            panic!("expected a card");
        };
        let json = serde_json::to_value(card).unwrap();
        assert!(json["options"][0].get("correct").is_none());
    }

    #[test]
    fn test_dead_item_skipped() {
        let mut ctx = context_with(&["Q1"]);
        ctx.enqueue_for_review_at("GONE", false, t0() - Duration::days(2));
        ctx.enqueue_for_review_at("Q1", false, t0());
        let mut session = ReviewSession::new();

        let SessionState::Presenting { card, .. } = session.next_at(&mut ctx, t0()).unwrap() else {
            panic!("expected a card");
        };
        assert_eq!(card.question_id, "Q1");
        assert!(ctx.review().get("GONE").is_none());
    }
}
