//! Study filters over the merged bank

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::models::{Category, Classification, Difficulty, Question};

/// Filter for the study pool. `None` on a field means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyFilter {
    pub classification: Option<Classification>,
    pub lesion_key: Option<String>,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
}

impl StudyFilter {
    pub fn matches(&self, question: &Question) -> bool {
        self.classification.map_or(true, |c| question.classification == c)
            && self
                .lesion_key
                .as_deref()
                .map_or(true, |k| question.lesion_key.eq_ignore_ascii_case(k))
            && self.category.map_or(true, |c| question.category == c)
            && self.difficulty.map_or(true, |d| question.difficulty == d)
    }
}

/// Questions matching the filter, in bank order
pub fn filter_bank<'a>(bank: &'a [Question], filter: &StudyFilter) -> Vec<&'a Question> {
    bank.iter().filter(|q| filter.matches(q)).collect()
}

/// A distinct lesion present in the bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LesionEntry {
    pub key: String,
    pub label: String,
    pub classification: Classification,
    pub question_count: usize,
}

/// Unique lesions, sorted by label. The first question seen for a key
/// supplies its label and classification.
pub fn lesions(bank: &[Question]) -> Vec<LesionEntry> {
    let mut by_key: HashMap<&str, LesionEntry> = HashMap::new();

    for question in bank {
        by_key
            .entry(question.lesion_key.as_str())
            .or_insert_with(|| LesionEntry {
                key: question.lesion_key.clone(),
                label: question.lesion_group.clone(),
                classification: question.classification,
                question_count: 0,
            })
            .question_count += 1;
    }

    let mut entries: Vec<LesionEntry> = by_key.into_values().collect();
    entries.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    entries
}
