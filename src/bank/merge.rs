//! Merging the core bank with local overrides

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::{normalize_question, normalize_question_value, Question};

/// Question id -> replacement or added question, in insertion order
pub type OverrideMap = IndexMap<String, Question>;

/// Build the merged bank.
///
/// Core questions come first in core order, each replaced by its override when
/// one exists. Override-only questions follow in override insertion order.
/// Every emitted question is normalized, and overrides are emitted under
/// their map key.
pub fn build_bank(core: &[Question], overrides: &OverrideMap) -> Vec<Question> {
    let core_ids: HashSet<&str> = core.iter().map(|q| q.id.as_str()).collect();
    let mut merged = Vec::with_capacity(core.len() + overrides.len());

    for question in core {
        match overrides.get(&question.id) {
            Some(replacement) => merged.push(override_entry(&question.id, replacement)),
            None => merged.push(normalize_question(question.clone())),
        }
    }

    for (id, question) in overrides {
        if !core_ids.contains(id.as_str()) {
            merged.push(override_entry(id, question));
        }
    }

    merged
}

fn override_entry(id: &str, question: &Question) -> Question {
    let mut question = normalize_question(question.clone());
    if question.id != id {
        log::debug!("Override stored under '{}' carries id '{}'", id, question.id);
        question.id = id.to_string();
    }
    question
}

/// Decode a stored override map, skipping entries that cannot be read.
/// Document order is kept.
pub fn decode_overrides(raw: &str) -> OverrideMap {
    let mut overrides = OverrideMap::new();

    let entries: IndexMap<String, Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Unable to parse stored overrides: {}", e);
            return overrides;
        }
    };

    for (id, mut value) in entries {
        normalize_question_value(&mut value);
        match serde_json::from_value::<Question>(value) {
            Ok(question) => {
                overrides.insert(id, normalize_question(question));
            }
            Err(e) => log::warn!("Skipping unreadable override '{}': {}", id, e),
        }
    }

    overrides
}

/// Counts shown next to the admin override list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSummary {
    /// Number of stored overrides
    pub total: usize,
    /// Overrides whose id does not exist in the core bank
    pub new_questions: usize,
    pub core_size: usize,
}

impl OverrideSummary {
    pub fn compute(core: &[Question], overrides: &OverrideMap) -> Self {
        let core_ids: HashSet<&str> = core.iter().map(|q| q.id.as_str()).collect();
        let new_questions = overrides
            .keys()
            .filter(|id| !core_ids.contains(id.as_str()))
            .count();

        Self {
            total: overrides.len(),
            new_questions,
            core_size: core.len(),
        }
    }
}
