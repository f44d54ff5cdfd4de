//! Attempt statistics and quiz history

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recent contexts kept per question
pub const CONTEXT_CAPACITY: usize = 10;
/// Attempts kept in the global quiz history
pub const HISTORY_CAPACITY: usize = 200;

/// Answer checked in the study panel
pub const CONTEXT_STUDY: &str = "study";
/// Answer submitted during a quiz
pub const CONTEXT_QUIZ: &str = "quiz";
/// Quiz question lost to time expiry
pub const CONTEXT_QUIZ_TIME: &str = "quiz_time";
/// Quiz question left unanswered at the end
pub const CONTEXT_QUIZ_SKIPPED: &str = "quiz_skipped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptResult {
    Correct,
    Incorrect,
}

impl AttemptResult {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }
}

/// One entry of a question's recent context log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptContext {
    pub context: String,
    pub correct: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Per-question statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub last_result: Option<AttemptResult>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contexts: VecDeque<AttemptContext>,
}

/// One entry of the global quiz history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub question_id: String,
    pub correct: bool,
    pub context: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Everything the attempt recorder persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    #[serde(default)]
    pub questions: BTreeMap<String, AttemptStats>,
    #[serde(default)]
    pub quiz_history: VecDeque<HistoryEntry>,
}

/// Stored layout with entries left undecoded
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProgressState {
    #[serde(default)]
    questions: BTreeMap<String, Value>,
    #[serde(default)]
    quiz_history: Vec<Value>,
}

/// Totals across every recorded question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub questions_seen: usize,
    pub attempts: u32,
    pub correct: u32,
    /// Fraction of attempts answered correctly (0.0 when nothing was attempted)
    pub accuracy: f64,
    /// Questions whose most recent attempt was incorrect
    pub missed: usize,
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, capacity: usize) {
    buffer.push_back(item);
    while buffer.len() > capacity {
        buffer.pop_front();
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode stored progress. Unreadable entries are skipped; an unreadable
    /// document gives empty state.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                log::warn!("Unable to parse stored progress: {}", e);
                Self::default()
            }
        }
    }

    /// Same as [`ProgressState::decode`] for an already parsed document
    pub fn from_value(value: Value) -> Self {
        let parsed: RawProgressState = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Unable to read progress data: {}", e);
                return Self::default();
            }
        };

        let mut state = Self::default();
        for (id, value) in parsed.questions {
            match serde_json::from_value::<AttemptStats>(value) {
                Ok(stats) => {
                    state.questions.insert(id, stats);
                }
                Err(e) => log::warn!("Dropping unreadable stats for '{}': {}", id, e),
            }
        }
        for value in parsed.quiz_history {
            match serde_json::from_value::<HistoryEntry>(value) {
                Ok(entry) => state.quiz_history.push_back(entry),
                Err(e) => log::warn!("Dropping unreadable history entry: {}", e),
            }
        }
        state.enforce_capacity();
        state
    }

    /// Record one answer event
    pub fn record_attempt(&mut self, question_id: &str, correct: bool, context: &str, now: DateTime<Utc>) {
        let stats = self.questions.entry(question_id.to_string()).or_default();
        stats.attempts += 1;
        if correct {
            stats.correct += 1;
        }
        stats.last_result = Some(AttemptResult::from_correct(correct));
        stats.last_seen = Some(now);
        push_bounded(
            &mut stats.contexts,
            AttemptContext {
                context: context.to_string(),
                correct,
                timestamp: now,
            },
            CONTEXT_CAPACITY,
        );

        push_bounded(
            &mut self.quiz_history,
            HistoryEntry {
                question_id: question_id.to_string(),
                correct,
                context: context.to_string(),
                timestamp: now,
            },
            HISTORY_CAPACITY,
        );
    }

    pub fn stats(&self, question_id: &str) -> Option<&AttemptStats> {
        self.questions.get(question_id)
    }

    /// Ids whose most recent attempt was incorrect
    pub fn missed_question_ids(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|(_, stats)| stats.last_result == Some(AttemptResult::Incorrect))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn summary(&self) -> ProgressSummary {
        let attempts: u32 = self.questions.values().map(|s| s.attempts).sum();
        let correct: u32 = self.questions.values().map(|s| s.correct).sum();
        let accuracy = if attempts == 0 {
            0.0
        } else {
            correct as f64 / attempts as f64
        };

        ProgressSummary {
            questions_seen: self.questions.len(),
            attempts,
            correct,
            accuracy,
            missed: self.missed_question_ids().len(),
        }
    }

    /// Trim buffers that came in over capacity (imported or hand-edited data)
    pub fn enforce_capacity(&mut self) {
        for stats in self.questions.values_mut() {
            while stats.contexts.len() > CONTEXT_CAPACITY {
                stats.contexts.pop_front();
            }
        }
        while self.quiz_history.len() > HISTORY_CAPACITY {
            self.quiz_history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_first_attempt_initializes_stats() {
        let mut progress = ProgressState::new();
        progress.record_attempt("Q1", false, CONTEXT_QUIZ, t0());

        let stats = progress.stats("Q1").unwrap();
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.correct, 0);
        assert_eq!(stats.last_result, Some(AttemptResult::Incorrect));
        assert_eq!(stats.last_seen, Some(t0()));
        assert_eq!(stats.contexts.len(), 1);
        assert_eq!(stats.contexts[0].context, "quiz");
        assert_eq!(progress.quiz_history.len(), 1);
        assert_eq!(progress.quiz_history[0].question_id, "Q1");
    }

    #[test]
    fn test_correct_attempts_counted() {
        let mut progress = ProgressState::new();
        progress.record_attempt("Q1", true, CONTEXT_STUDY, t0());
        progress.record_attempt("Q1", false, CONTEXT_STUDY, t0() + Duration::minutes(1));
        progress.record_attempt("Q1", true, CONTEXT_STUDY, t0() + Duration::minutes(2));

        let stats = progress.stats("Q1").unwrap();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.correct, 2);
        assert_eq!(stats.last_result, Some(AttemptResult::Correct));
        assert_eq!(stats.last_seen, Some(t0() + Duration::minutes(2)));
    }

    #[test]
    fn test_context_buffer_evicts_oldest() {
        let mut progress = ProgressState::new();
        for i in 0..15 {
            progress.record_attempt("Q1", i % 2 == 0, &format!("ctx{}", i), t0() + Duration::seconds(i));
        }

        let stats = progress.stats("Q1").unwrap();
        assert_eq!(stats.contexts.len(), CONTEXT_CAPACITY);
        assert_eq!(stats.contexts.front().unwrap().context, "ctx5");
        assert_eq!(stats.contexts.back().unwrap().context, "ctx14");
        assert_eq!(stats.attempts, 15);
    }

    #[test]
    fn test_missed_and_summary() {
        let mut progress = ProgressState::new();
        progress.record_attempt("Q1", false, CONTEXT_QUIZ, t0());
        progress.record_attempt("Q2", true, CONTEXT_QUIZ, t0());
        progress.record_attempt("Q3", true, CONTEXT_QUIZ, t0());
        progress.record_attempt("Q3", false, CONTEXT_QUIZ_SKIPPED, t0());

        assert_eq!(progress.missed_question_ids(), vec!["Q1", "Q3"]);

        let summary = progress.summary();
        assert_eq!(summary.questions_seen, 3);
        assert_eq!(summary.attempts, 4);
        assert_eq!(summary.correct, 2);
        assert!((summary.accuracy - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.missed, 2);
    }

    #[test]
    fn test_wire_format() {
        let mut progress = ProgressState::new();
        progress.record_attempt("Q1", true, CONTEXT_QUIZ, t0());

        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["questions"]["Q1"]["lastResult"], "correct");
        assert_eq!(value["questions"]["Q1"]["lastSeen"], t0().timestamp_millis());
        assert_eq!(value["quizHistory"][0]["questionId"], "Q1");
        assert_eq!(value["quizHistory"][0]["timestamp"], t0().timestamp_millis());
    }

    #[test]
    fn test_decode_tolerates_missing_fields_and_garbage() {
        let state = ProgressState::decode(r#"{"questions":{"Q1":{"attempts":2}}}"#);
        assert_eq!(state.stats("Q1").unwrap().attempts, 2);
        assert!(state.quiz_history.is_empty());

        let state = ProgressState::decode("{not json");
        assert_eq!(state, ProgressState::default());
    }

    #[test]
    fn test_decode_skips_only_malformed_entries() {
        let raw = format!(
            r#"{{
                "questions": {{
                    "Q1": {{"attempts": 4, "correct": 3, "lastResult": "correct", "lastSeen": {ms}}},
                    "Q2": {{"attempts": 1, "correct": 0, "lastResult": "skipped"}}
                }},
                "quizHistory": [
                    {{"questionId": "Q1", "correct": true, "context": "quiz", "timestamp": {ms}}},
                    {{"questionId": "Q2", "correct": "maybe"}}
                ]
            }}"#,
            ms = t0().timestamp_millis()
        );

        let state = ProgressState::decode(&raw);
        let stats = state.stats("Q1").unwrap();
        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.last_seen, Some(t0()));
        assert!(state.stats("Q2").is_none());
        assert_eq!(state.quiz_history.len(), 1);
        assert_eq!(state.quiz_history[0].question_id, "Q1");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_ring_buffers_stay_bounded(
            attempts in proptest::collection::vec((0usize..4, any::<bool>()), 0..400)
        ) {
            let mut progress = ProgressState::new();
            for (i, (question, correct)) in attempts.iter().enumerate() {
                let id = format!("Q{}", question);
                progress.record_attempt(&id, *correct, CONTEXT_QUIZ, t0() + Duration::seconds(i as i64));
            }

            prop_assert!(progress.quiz_history.len() <= HISTORY_CAPACITY);
            prop_assert_eq!(progress.quiz_history.len(), attempts.len().min(HISTORY_CAPACITY));
            for stats in progress.questions.values() {
                prop_assert!(stats.contexts.len() <= CONTEXT_CAPACITY);
            }
            let total: u32 = progress.questions.values().map(|s| s.attempts).sum();
            prop_assert_eq!(total as usize, attempts.len());
        }
    }
}
