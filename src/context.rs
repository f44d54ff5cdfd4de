//! Study context
//!
//! `StudyContext` owns the core bank, the override map, attempt progress and
//! the review schedule, together with the store they persist to. Every
//! operation runs to completion on `&mut self`. Persistence failures are
//! logged and the in-memory state stays authoritative.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::{build_bank, decode_overrides, normalize_question, OverrideMap, OverrideSummary, Question, QuestionType};
use crate::interchange::{self, build_export, process_import, ExportPayload, ImportOptions, ImportResult};
use crate::progress::{ProgressState, CONTEXT_STUDY};
use crate::review::{schedule, select_next, review_status, ReviewItem, ReviewState, ReviewStatus, ReviewUpdate};
use crate::storage::{save_json, KeyValueStore, MemoryStore, OVERRIDES_KEY, PROGRESS_KEY, REVIEW_KEY};

/// Reasons an edited question is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("Question id is required")]
    MissingId,

    #[error("Question '{0}' has no options")]
    NoOptions(String),

    #[error("Question '{0}' has no correct option")]
    NoCorrectOption(String),

    #[error("True/false question '{0}' needs exactly two options, found {1}")]
    TrueFalseOptions(String, usize),
}

/// What the learner sees after checking an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_keys: Vec<String>,
    pub rationale: String,
    /// Follow-up text, only filled in after a miss
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remediation: String,
}

impl AnswerFeedback {
    pub fn for_question(question: &Question, correct: bool) -> Self {
        Self {
            correct,
            correct_keys: question.correct_keys().iter().map(|k| k.to_string()).collect(),
            rationale: question.rationale.clone(),
            remediation: if correct {
                String::new()
            } else {
                question.remediation.clone()
            },
        }
    }
}

pub struct StudyContext {
    core_bank: Vec<Question>,
    overrides: OverrideMap,
    progress: ProgressState,
    review: ReviewState,
    bank: Vec<Question>,
    store: Box<dyn KeyValueStore>,
}

fn read_key(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Failed to read '{}': {}", key, e);
            None
        }
    }
}

impl StudyContext {
    /// Rehydrate state from `store` and merge it with the core bank.
    /// Unreadable documents fall back to empty state.
    pub fn new(core_bank: Vec<Question>, store: Box<dyn KeyValueStore>) -> Self {
        let overrides = read_key(store.as_ref(), OVERRIDES_KEY)
            .map(|raw| decode_overrides(&raw))
            .unwrap_or_default();
        let progress = read_key(store.as_ref(), PROGRESS_KEY)
            .map(|raw| ProgressState::decode(&raw))
            .unwrap_or_default();
        let review = read_key(store.as_ref(), REVIEW_KEY)
            .map(|raw| ReviewState::decode(&raw))
            .unwrap_or_default();

        log::info!(
            "Loaded study state: {} core questions, {} overrides, {} tracked, {} in review",
            core_bank.len(),
            overrides.len(),
            progress.questions.len(),
            review.len()
        );

        let mut ctx = Self {
            core_bank,
            overrides,
            progress,
            review,
            bank: Vec::new(),
            store,
        };
        ctx.rebuild_bank();
        ctx
    }

    /// A context that keeps nothing beyond the process
    pub fn in_memory(core_bank: Vec<Question>) -> Self {
        Self::new(core_bank, Box::new(MemoryStore::new()))
    }

    pub fn bank(&self) -> &[Question] {
        &self.bank
    }

    pub fn core_bank(&self) -> &[Question] {
        &self.core_bank
    }

    pub fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn review(&self) -> &ReviewState {
        &self.review
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.bank.iter().find(|q| q.id == question_id)
    }

    /// Recompute the merged bank after the core bank or overrides changed
    pub fn rebuild_bank(&mut self) {
        self.bank = build_bank(&self.core_bank, &self.overrides);
    }

    // ===== Attempts =====

    pub fn record_attempt(&mut self, question_id: &str, correct: bool, context: &str) {
        self.record_attempt_at(question_id, correct, context, Utc::now());
    }

    pub fn record_attempt_at(&mut self, question_id: &str, correct: bool, context: &str, now: DateTime<Utc>) {
        self.progress.record_attempt(question_id, correct, context, now);
        self.persist_progress();
    }

    // ===== Review scheduling =====

    /// Put a question on the review queue. An urgent enqueue of an existing
    /// item makes it due immediately.
    pub fn enqueue_for_review(&mut self, question_id: &str, urgent: bool) {
        self.enqueue_for_review_at(question_id, urgent, Utc::now());
    }

    pub fn enqueue_for_review_at(&mut self, question_id: &str, urgent: bool, now: DateTime<Utc>) {
        match self.review.items.get_mut(question_id) {
            Some(item) => {
                if !urgent {
                    return;
                }
                item.due = now;
                item.last_queued = Some(now);
            }
            None => {
                self.review
                    .items
                    .insert(question_id.to_string(), ReviewItem::new(now));
            }
        }
        log::debug!("Queued '{}' for review (urgent: {})", question_id, urgent);
        self.persist_review();
    }

    /// Grade a review item with a self-assessed quality (0-5)
    pub fn update_review_item(&mut self, question_id: &str, quality: u8) -> ReviewUpdate {
        self.update_review_item_at(question_id, quality, Utc::now())
    }

    pub fn update_review_item_at(&mut self, question_id: &str, quality: u8, now: DateTime<Utc>) -> ReviewUpdate {
        if self.question(question_id).is_none() {
            log::debug!("Review item '{}' has no question, removing it", question_id);
            if self.review.items.shift_remove(question_id).is_some() {
                self.persist_review();
            }
            return ReviewUpdate::Purged;
        }

        let current = self.review.items.get(question_id).cloned().unwrap_or_else(|| ReviewItem {
            last_queued: None,
            ..ReviewItem::new(now)
        });

        let next = schedule(&current, quality, now);
        log::debug!(
            "Scheduled '{}': quality {}, interval {}d, ease {:.2}",
            question_id,
            quality,
            next.interval,
            next.ease
        );

        self.review.items.insert(question_id.to_string(), next.clone());
        self.persist_review();

        ReviewUpdate::Scheduled(next)
    }

    /// Id of the next question to review. Items whose question left the bank
    /// are purged along the way.
    pub fn load_next_review(&mut self) -> Option<String> {
        self.load_next_review_at(Utc::now())
    }

    pub fn load_next_review_at(&mut self, now: DateTime<Utc>) -> Option<String> {
        let live: HashSet<&str> = self.bank.iter().map(|q| q.id.as_str()).collect();
        let selection = select_next(&self.review.items, |id| live.contains(id), now);

        if !selection.purge.is_empty() {
            log::info!("Purging {} review items with no question", selection.purge.len());
            for id in &selection.purge {
                self.review.items.shift_remove(id);
            }
            self.persist_review();
        }

        selection.next
    }

    pub fn review_status(&self) -> ReviewStatus {
        self.review_status_at(Utc::now())
    }

    pub fn review_status_at(&self, now: DateTime<Utc>) -> ReviewStatus {
        review_status(&self.review.items, now)
    }

    // ===== Answering =====

    /// Check a study-panel answer. Misses go onto the review queue urgently.
    pub fn answer_study(&mut self, question_id: &str, selected: &[String]) -> Option<AnswerFeedback> {
        self.answer_question_at(question_id, selected, CONTEXT_STUDY, Utc::now())
    }

    /// Grade `selected`, record the attempt under `context` and queue a miss
    pub fn answer_question_at(
        &mut self,
        question_id: &str,
        selected: &[String],
        context: &str,
        now: DateTime<Utc>,
    ) -> Option<AnswerFeedback> {
        let question = self.question(question_id)?;
        let correct = question.is_correct(selected);
        let feedback = AnswerFeedback::for_question(question, correct);

        self.record_attempt_at(question_id, correct, context, now);
        if !correct {
            self.enqueue_for_review_at(question_id, true, now);
        }

        Some(feedback)
    }

    // ===== Overrides =====

    /// Store an edited or new question
    pub fn save_override(&mut self, question: Question) -> Result<(), OverrideError> {
        let id = question.id.trim().to_string();
        if id.is_empty() {
            return Err(OverrideError::MissingId);
        }
        if question.options.is_empty() {
            return Err(OverrideError::NoOptions(id));
        }
        if !question.has_correct_option() {
            return Err(OverrideError::NoCorrectOption(id));
        }
        if question.question_type == QuestionType::Tf && question.options.len() != 2 {
            return Err(OverrideError::TrueFalseOptions(id, question.options.len()));
        }

        let question = normalize_question(Question { id: id.clone(), ..question });
        log::info!("Saving override '{}'", id);
        self.overrides.insert(id, question);
        self.persist_overrides();
        self.rebuild_bank();
        Ok(())
    }

    /// Drop an override, returning whether one existed
    pub fn delete_override(&mut self, question_id: &str) -> bool {
        if self.overrides.shift_remove(question_id).is_none() {
            return false;
        }
        log::info!("Deleted override '{}'", question_id);
        self.persist_overrides();
        self.rebuild_bank();
        true
    }

    pub fn override_summary(&self) -> OverrideSummary {
        OverrideSummary::compute(&self.core_bank, &self.overrides)
    }

    /// Forget overrides, progress and the review schedule
    pub fn clear_data(&mut self) {
        log::info!("Clearing all local study data");
        self.overrides.clear();
        self.progress = ProgressState::new();
        self.review = ReviewState::new();
        for key in [OVERRIDES_KEY, PROGRESS_KEY, REVIEW_KEY] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to clear '{}': {}", key, e);
            }
        }
        self.rebuild_bank();
    }

    // ===== Import / export =====

    /// Validate an import document against the current state without applying it
    pub fn preview_import(&self, raw: &str, options: ImportOptions) -> interchange::Result<ImportResult> {
        process_import(raw, options, &self.core_bank, &self.overrides)
    }

    /// Install a processed import
    pub fn apply_import(&mut self, result: &ImportResult) {
        self.overrides = result.overrides.clone();
        self.persist_overrides();

        if let Some(progress) = &result.progress {
            self.progress = progress.clone();
            self.persist_progress();
        }
        if let Some(review) = &result.review {
            self.review = review.clone();
            self.persist_review();
        }

        self.rebuild_bank();
        log::info!("Import applied: {}", result);
    }

    /// Process and apply an import document in one step
    pub fn import_json(&mut self, raw: &str, options: ImportOptions) -> interchange::Result<ImportResult> {
        let result = self.preview_import(raw, options)?;
        self.apply_import(&result);
        Ok(result)
    }

    pub fn export_payload(&self) -> ExportPayload {
        self.export_payload_at(Utc::now())
    }

    pub fn export_payload_at(&self, now: DateTime<Utc>) -> ExportPayload {
        build_export(self.core_bank.len(), &self.bank, &self.progress, &self.review, now)
    }

    // ===== Persistence =====

    fn persist_overrides(&mut self) {
        if let Err(e) = save_json(self.store.as_mut(), OVERRIDES_KEY, &self.overrides) {
            log::warn!("Failed to persist overrides: {}", e);
        }
    }

    fn persist_progress(&mut self) {
        if let Err(e) = save_json(self.store.as_mut(), PROGRESS_KEY, &self.progress) {
            log::warn!("Failed to persist progress: {}", e);
        }
    }

    fn persist_review(&mut self) {
        if let Err(e) = save_json(self.store.as_mut(), REVIEW_KEY, &self.review) {
            log::warn!("Failed to persist review schedule: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bank::models::tests::sample_question;
    use crate::interchange::schema::tests::schema_json;
    use crate::progress::CONTEXT_QUIZ;
    use crate::storage::{FileStore, StorageError};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    pub(crate) fn context_with(ids: &[&str]) -> StudyContext {
        StudyContext::in_memory(ids.iter().map(|id| sample_question(id)).collect())
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> crate::storage::Result<Option<String>> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")))
        }

        fn set(&mut self, _key: &str, _value: &str) -> crate::storage::Result<()> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }

        fn remove(&mut self, key: &str) -> crate::storage::Result<()> {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = TempDir::new().unwrap();
        let core = vec![sample_question("Q1")];

        {
            let mut ctx = StudyContext::new(core.clone(), Box::new(FileStore::new(dir.path().to_path_buf())));
            ctx.record_attempt_at("Q1", false, CONTEXT_QUIZ, t0());
            ctx.enqueue_for_review_at("Q1", false, t0());
            ctx.update_review_item_at("Q1", 5, t0());
        }

        let ctx = StudyContext::new(core, Box::new(FileStore::new(dir.path().to_path_buf())));
        assert_eq!(ctx.progress().stats("Q1").unwrap().attempts, 1);
        let item = ctx.review().get("Q1").unwrap();
        assert_eq!(item.repetition, 1);
        assert_eq!(item.last_quality, Some(5));
    }

    #[test]
    fn test_fresh_item_graded_five() {
        let mut ctx = context_with(&["Q1"]);
        let update = ctx.update_review_item_at("Q1", 5, t0());

        let ReviewUpdate::Scheduled(item) = update else {
            panic!("expected a scheduled item");
        };
        assert_eq!(item.repetition, 1);
        assert_eq!(item.interval, 1);
        assert!((item.ease - 2.6).abs() < 1e-9);
        assert_eq!(item.due, t0() + Duration::days(1));
    }

    #[test]
    fn test_fresh_item_graded_two() {
        let mut ctx = context_with(&["Q1"]);
        ctx.update_review_item_at("Q1", 2, t0());

        let item = ctx.review().get("Q1").unwrap();
        assert_eq!(item.repetition, 0);
        assert_eq!(item.interval, 1);
        assert_eq!(item.ease, 2.5);
    }

    #[test]
    fn test_consecutive_fives() {
        let mut ctx = context_with(&["Q1"]);
        ctx.update_review_item_at("Q1", 5, t0());
        ctx.update_review_item_at("Q1", 5, t0() + Duration::days(1));

        assert_eq!(ctx.review().get("Q1").unwrap().interval, 6);
    }

    #[test]
    fn test_grading_missing_question_purges() {
        let mut ctx = context_with(&["Q1"]);
        ctx.enqueue_for_review_at("GONE", false, t0());

        assert_eq!(ctx.update_review_item_at("GONE", 4, t0()), ReviewUpdate::Purged);
        assert!(ctx.review().get("GONE").is_none());
    }

    #[test]
    fn test_enqueue_keeps_existing_unless_urgent() {
        let mut ctx = context_with(&["Q1"]);
        ctx.update_review_item_at("Q1", 5, t0());
        let due = ctx.review().get("Q1").unwrap().due;

        ctx.enqueue_for_review_at("Q1", false, t0() + Duration::hours(1));
        assert_eq!(ctx.review().get("Q1").unwrap().due, due);

        let later = t0() + Duration::hours(2);
        ctx.enqueue_for_review_at("Q1", true, later);
        let item = ctx.review().get("Q1").unwrap();
        assert_eq!(item.due, later);
        assert_eq!(item.last_queued, Some(later));
        assert_eq!(item.repetition, 1);
    }

    #[test]
    fn test_next_review_purges_dead_items() {
        let mut ctx = context_with(&["Q1", "Q2"]);
        ctx.enqueue_for_review_at("DEAD", false, t0() - Duration::days(3));
        ctx.enqueue_for_review_at("Q2", false, t0() - Duration::days(1));
        ctx.enqueue_for_review_at("Q1", false, t0());

        assert_eq!(ctx.load_next_review_at(t0()).as_deref(), Some("Q2"));
        assert!(ctx.review().get("DEAD").is_none());
        assert_eq!(ctx.review().len(), 2);
    }

    #[test]
    fn test_next_review_falls_back_to_earliest() {
        let mut ctx = context_with(&["Q1", "Q2"]);
        ctx.update_review_item_at("Q1", 5, t0());
        ctx.update_review_item_at("Q2", 5, t0() - Duration::hours(1));

        assert_eq!(ctx.load_next_review_at(t0()).as_deref(), Some("Q2"));
        assert_eq!(ctx.review_status_at(t0()), ReviewStatus { due: 0, scheduled: 2 });
    }

    #[test]
    fn test_next_review_empty() {
        let mut ctx = context_with(&["Q1"]);
        assert_eq!(ctx.load_next_review_at(t0()), None);
    }

    #[test]
    fn test_study_miss_is_queued() {
        let mut ctx = context_with(&["Q1"]);
        let feedback = ctx
            .answer_question_at("Q1", &["B".to_string()], CONTEXT_STUDY, t0())
            .unwrap();

        assert!(!feedback.correct);
        assert_eq!(feedback.correct_keys, vec!["A"]);
        assert!(ctx.review().get("Q1").unwrap().is_due(t0()));
        assert_eq!(ctx.progress().stats("Q1").unwrap().contexts[0].context, "study");
    }

    #[test]
    fn test_study_hit_is_not_queued() {
        let mut ctx = context_with(&["Q1"]);
        let feedback = ctx.answer_study("Q1", &["a".to_string()]).unwrap();

        assert!(feedback.correct);
        assert!(ctx.review().is_empty());
        assert!(ctx.answer_study("NOPE", &["A".to_string()]).is_none());
    }

    #[test]
    fn test_save_override_validation() {
        let mut ctx = context_with(&["Q1"]);

        let mut no_id = sample_question("  ");
        no_id.id = "  ".to_string();
        assert_eq!(ctx.save_override(no_id), Err(OverrideError::MissingId));

        let mut no_options = sample_question("Q1");
        no_options.options.clear();
        assert!(matches!(ctx.save_override(no_options), Err(OverrideError::NoOptions(_))));

        let mut no_correct = sample_question("Q1");
        no_correct.options.iter_mut().for_each(|o| o.correct = false);
        assert!(matches!(ctx.save_override(no_correct), Err(OverrideError::NoCorrectOption(_))));

        let mut tf = sample_question("Q1");
        tf.question_type = QuestionType::Tf;
        tf.options.push(crate::bank::QuestionOption::new("C", "Maybe", false));
        assert!(matches!(
            ctx.save_override(tf),
            Err(OverrideError::TrueFalseOptions(_, 3))
        ));

        assert!(ctx.overrides().is_empty());
    }

    #[test]
    fn test_override_lifecycle() {
        let mut ctx = context_with(&["Q1"]);

        let mut edited = sample_question("Q1");
        edited.prompt = "Edited".to_string();
        ctx.save_override(edited).unwrap();
        ctx.save_override(sample_question("NEW")).unwrap();

        assert_eq!(ctx.bank().len(), 2);
        assert_eq!(ctx.question("Q1").unwrap().prompt, "Edited");
        assert_eq!(ctx.override_summary().new_questions, 1);

        assert!(ctx.delete_override("NEW"));
        assert!(!ctx.delete_override("NEW"));
        assert!(ctx.question("NEW").is_none());
    }

    #[test]
    fn test_deleted_question_review_item_is_purged_lazily() {
        let mut ctx = context_with(&["Q1"]);
        ctx.save_override(sample_question("NEW")).unwrap();
        ctx.enqueue_for_review_at("NEW", false, t0());
        ctx.delete_override("NEW");

        assert_eq!(ctx.review().len(), 1);
        assert_eq!(ctx.load_next_review_at(t0()), None);
        assert!(ctx.review().is_empty());
    }

    #[test]
    fn test_failing_store_keeps_working_in_memory() {
        let mut ctx = StudyContext::new(vec![sample_question("Q1")], Box::new(FailingStore));

        ctx.record_attempt_at("Q1", true, CONTEXT_STUDY, t0());
        ctx.enqueue_for_review_at("Q1", false, t0());

        assert_eq!(ctx.progress().stats("Q1").unwrap().correct, 1);
        assert_eq!(ctx.load_next_review_at(t0()).as_deref(), Some("Q1"));
    }

    #[test]
    fn test_import_and_export() {
        let mut ctx = context_with(&["Q1"]);
        let raw = json!([schema_json("IMP-1")]).to_string();

        let result = ctx.import_json(&raw, ImportOptions::default()).unwrap();
        assert_eq!(result.applied_count, 1);
        assert!(ctx.question("IMP-1").is_some());

        let payload = ctx.export_payload_at(t0());
        assert_eq!(payload.core_size, 1);
        assert_eq!(payload.questions.len(), 2);
    }

    #[test]
    fn test_clear_data() {
        let mut ctx = context_with(&["Q1"]);
        ctx.save_override(sample_question("NEW")).unwrap();
        ctx.record_attempt_at("Q1", false, CONTEXT_QUIZ, t0());
        ctx.enqueue_for_review_at("Q1", true, t0());

        ctx.clear_data();
        assert!(ctx.overrides().is_empty());
        assert!(ctx.progress().questions.is_empty());
        assert!(ctx.review().is_empty());
        assert_eq!(ctx.bank().len(), 1);
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(PROGRESS_KEY, "{ not json").unwrap();
        store.set(REVIEW_KEY, "[]").unwrap();
        store.set(OVERRIDES_KEY, "{\"Q9\": {\"id\": 7}}").unwrap();

        let ctx = StudyContext::new(vec![sample_question("Q1")], Box::new(store));
        assert!(ctx.progress().questions.is_empty());
        assert!(ctx.review().is_empty());
        assert!(ctx.overrides().is_empty());
    }
}
