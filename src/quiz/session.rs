//! A quiz in progress

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use super::models::{LesionScore, QuizResponse, QuizResults, ResponseOutcome};
use super::{QuizError, Result};
use crate::bank::Question;
use crate::context::{AnswerFeedback, StudyContext};
use crate::progress::{CONTEXT_QUIZ, CONTEXT_QUIZ_SKIPPED, CONTEXT_QUIZ_TIME};

/// Questions are answered in order. Every miss, flag, timeout and skip puts
/// the question on the review queue urgently.
#[derive(Debug)]
pub struct QuizSession {
    questions: Vec<Question>,
    responses: Vec<QuizResponse>,
    flagged: BTreeSet<String>,
    started_at: DateTime<Utc>,
    time_limit: Option<Duration>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        Self {
            questions,
            responses: Vec::new(),
            flagged: BTreeSet::new(),
            started_at,
            time_limit: None,
        }
    }

    /// Limit the quiz to `minutes`; zero leaves it untimed
    pub fn with_timer(mut self, minutes: u32) -> Self {
        self.time_limit = (minutes > 0).then(|| Duration::minutes(i64::from(minutes)));
        self
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.responses.len())
    }

    /// 1-based position of the current question
    pub fn position(&self) -> usize {
        self.responses.len() + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_timed(&self) -> bool {
        self.time_limit.is_some()
    }

    /// Time left on the clock, `None` for untimed quizzes
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.time_limit
            .map(|limit| (self.started_at + limit - now).max(Duration::zero()))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).map_or(false, |left| left <= Duration::zero())
    }

    pub fn is_flagged(&self, question_id: &str) -> bool {
        self.flagged.contains(question_id)
    }

    /// Grade the current question and move on
    pub fn answer(&mut self, ctx: &mut StudyContext, selected: &[String], now: DateTime<Utc>) -> Result<AnswerFeedback> {
        if selected.is_empty() {
            return Err(QuizError::NoSelection);
        }
        let question = self.current().ok_or(QuizError::Finished)?;
        let correct = question.is_correct(selected);
        let feedback = AnswerFeedback::for_question(question, correct);
        let question_id = question.id.clone();

        ctx.record_attempt_at(&question_id, correct, CONTEXT_QUIZ, now);
        if !correct {
            ctx.enqueue_for_review_at(&question_id, true, now);
        }

        self.responses.push(QuizResponse {
            question_id,
            correct,
            selected: selected.to_vec(),
            outcome: ResponseOutcome::Answered,
        });
        Ok(feedback)
    }

    /// Flag the current question for review
    pub fn flag(&mut self, ctx: &mut StudyContext, now: DateTime<Utc>) -> Result<()> {
        let question_id = self.current().ok_or(QuizError::Finished)?.id.clone();
        if self.flagged.insert(question_id.clone()) {
            ctx.enqueue_for_review_at(&question_id, true, now);
        }
        Ok(())
    }

    /// Remove the flag from the current question. The review item stays.
    pub fn unflag(&mut self) -> Result<bool> {
        let question_id = self.current().ok_or(QuizError::Finished)?.id.clone();
        Ok(self.flagged.remove(&question_id))
    }

    /// The timer ran out: the current question counts as missed and the
    /// rest are skipped
    pub fn expire(mut self, ctx: &mut StudyContext, now: DateTime<Utc>) -> QuizResults {
        if let Some(question) = self.current() {
            let question_id = question.id.clone();
            ctx.record_attempt_at(&question_id, false, CONTEXT_QUIZ_TIME, now);
            ctx.enqueue_for_review_at(&question_id, true, now);
            self.responses.push(QuizResponse {
                question_id,
                correct: false,
                selected: Vec::new(),
                outcome: ResponseOutcome::TimedOut,
            });
        }
        self.close(ctx, now, true)
    }

    /// End the quiz, skipping whatever is left
    pub fn finish(self, ctx: &mut StudyContext, now: DateTime<Utc>) -> QuizResults {
        self.close(ctx, now, false)
    }

    fn close(mut self, ctx: &mut StudyContext, now: DateTime<Utc>, timed_out: bool) -> QuizResults {
        for question in &self.questions[self.responses.len()..] {
            ctx.enqueue_for_review_at(&question.id, true, now);
            ctx.record_attempt_at(&question.id, false, CONTEXT_QUIZ_SKIPPED, now);
            self.responses.push(QuizResponse {
                question_id: question.id.clone(),
                correct: false,
                selected: Vec::new(),
                outcome: ResponseOutcome::Skipped,
            });
        }

        let mut elapsed = now - self.started_at;
        if let Some(limit) = self.time_limit {
            elapsed = elapsed.min(limit);
        }

        let mut breakdown: Vec<LesionScore> = Vec::new();
        for (question, response) in self.questions.iter().zip(&self.responses) {
            let index = match breakdown.iter().position(|s| s.label == question.lesion_group) {
                Some(index) => index,
                None => {
                    breakdown.push(LesionScore {
                        label: question.lesion_group.clone(),
                        key: question.lesion_key.clone(),
                        correct: 0,
                        total: 0,
                    });
                    breakdown.len() - 1
                }
            };
            breakdown[index].total += 1;
            if response.correct {
                breakdown[index].correct += 1;
            }
        }

        let correct = self.responses.iter().filter(|r| r.correct).count();
        log::info!(
            "Quiz finished: {}/{} correct{}",
            correct,
            self.questions.len(),
            if timed_out { " (timed out)" } else { "" }
        );

        QuizResults {
            correct,
            total: self.questions.len(),
            timed_out,
            elapsed_seconds: elapsed.num_seconds().max(0),
            responses: self.responses,
            breakdown,
            flagged: self.flagged.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{context_with, t0};

    fn start(ctx: &StudyContext) -> QuizSession {
        QuizSession::new(ctx.bank().to_vec(), t0())
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_answers_are_recorded() {
        let mut ctx = context_with(&["Q1", "Q2"]);
        let mut quiz = start(&ctx);

        assert!(quiz.answer(&mut ctx, &keys(&["A"]), t0()).unwrap().correct);
        assert!(!quiz.answer(&mut ctx, &keys(&["B"]), t0()).unwrap().correct);
        assert!(quiz.current().is_none());
        assert_eq!(quiz.answer(&mut ctx, &keys(&["A"]), t0()).unwrap_err(), QuizError::Finished);

        assert!(ctx.review().get("Q1").is_none());
        assert!(ctx.review().get("Q2").is_some());
        assert_eq!(ctx.progress().stats("Q2").unwrap().contexts[0].context, CONTEXT_QUIZ);

        let results = quiz.finish(&mut ctx, t0() + Duration::seconds(90));
        assert_eq!((results.correct, results.total), (1, 2));
        assert_eq!(results.elapsed_seconds, 90);
        assert!(!results.timed_out);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let mut ctx = context_with(&["Q1"]);
        let mut quiz = start(&ctx);
        assert_eq!(quiz.answer(&mut ctx, &[], t0()).unwrap_err(), QuizError::NoSelection);
        assert_eq!(quiz.position(), 1);
    }

    #[test]
    fn test_finish_skips_remaining() {
        let mut ctx = context_with(&["Q1", "Q2", "Q3"]);
        let mut quiz = start(&ctx);
        quiz.answer(&mut ctx, &keys(&["A"]), t0()).unwrap();

        let results = quiz.finish(&mut ctx, t0());
        assert_eq!(results.responses[1].outcome, ResponseOutcome::Skipped);
        assert_eq!(results.responses[2].outcome, ResponseOutcome::Skipped);
        assert_eq!(ctx.progress().stats("Q3").unwrap().contexts[0].context, CONTEXT_QUIZ_SKIPPED);
        assert_eq!(ctx.review().len(), 2);
        assert_eq!(results.breakdown.len(), 1);
        assert_eq!(results.breakdown[0].correct, 1);
        assert_eq!(results.breakdown[0].total, 3);
    }

    #[test]
    fn test_timer_expiry() {
        let mut ctx = context_with(&["Q1", "Q2"]);
        let quiz = start(&ctx).with_timer(1);

        assert!(quiz.is_timed());
        assert!(!quiz.is_expired(t0() + Duration::seconds(59)));
        assert!(quiz.is_expired(t0() + Duration::seconds(60)));

        let results = quiz.expire(&mut ctx, t0() + Duration::seconds(75));
        assert!(results.timed_out);
        assert_eq!(results.elapsed_seconds, 60);
        assert_eq!(results.responses[0].outcome, ResponseOutcome::TimedOut);
        assert_eq!(ctx.progress().stats("Q1").unwrap().contexts[0].context, CONTEXT_QUIZ_TIME);
        assert_eq!(results.responses[1].outcome, ResponseOutcome::Skipped);
    }

    #[test]
    fn test_flagging() {
        let mut ctx = context_with(&["Q1"]);
        let mut quiz = start(&ctx);

        quiz.flag(&mut ctx, t0()).unwrap();
        assert!(quiz.is_flagged("Q1"));
        assert!(ctx.review().get("Q1").is_some());

        assert!(quiz.unflag().unwrap());
        assert!(!quiz.unflag().unwrap());
        assert!(ctx.review().get("Q1").is_some());

        quiz.flag(&mut ctx, t0()).unwrap();
        quiz.answer(&mut ctx, &keys(&["A"]), t0()).unwrap();
        let results = quiz.finish(&mut ctx, t0());
        assert_eq!(results.flagged, vec!["Q1"]);
    }
}
