//! Bulk import of questions (and optionally saved state)

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{questions_equal, validate_item, InvalidItem};
use super::{InterchangeError, Result};
use crate::bank::{OverrideMap, Question};
use crate::progress::ProgressState;
use crate::review::ReviewState;

/// How an import is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Take `progress` and `review` from an export payload
    pub include_state: bool,
    /// Start from the current overrides instead of an empty map
    pub merge_with_existing: bool,
}

/// Outcome of processing an import document. Nothing is applied yet.
#[derive(Debug, Clone)]
pub struct ImportResult {
    /// The override map to install
    pub overrides: OverrideMap,
    /// Replacement progress, `None` to keep the current one
    pub progress: Option<ProgressState>,
    /// Replacement review map, `None` to keep the current one
    pub review: Option<ReviewState>,
    /// Items that passed validation
    pub valid_count: usize,
    /// Valid items that ended up stored as overrides
    pub applied_count: usize,
    pub invalid_items: Vec<InvalidItem>,
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items loaded ({} overrides applied) \u{2022} {} invalid",
            self.valid_count,
            self.applied_count,
            self.invalid_items.len()
        )
    }
}

/// Validate and stage an import document.
///
/// The document is either an array of schema questions or an export payload
/// carrying a `questions` array. Invalid items are collected and skipped. A
/// valid question identical to its core entry is not stored as an override,
/// and when merging it removes an existing override for that id.
pub fn process_import(
    raw: &str,
    options: ImportOptions,
    core: &[Question],
    current_overrides: &OverrideMap,
) -> Result<ImportResult> {
    let data: Value = serde_json::from_str(raw)?;

    let items = match &data {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("questions") {
            Some(Value::Array(items)) => items,
            _ => return Err(InterchangeError::UnexpectedShape),
        },
        _ => return Err(InterchangeError::UnexpectedShape),
    };

    let mut invalid_items = Vec::new();
    let mut valid = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match validate_item(item, index) {
            Ok(question) => valid.push(question),
            Err(problem) => invalid_items.push(problem),
        }
    }

    let mut overrides = if options.merge_with_existing {
        current_overrides.clone()
    } else {
        OverrideMap::new()
    };

    let mut applied_count = 0;
    for question in &valid {
        let base = core.iter().find(|entry| entry.id == question.id);
        let matches_core = base.map_or(false, |base| questions_equal(base, question));

        if !matches_core {
            let unchanged = overrides
                .get(&question.id)
                .map_or(false, |current| questions_equal(current, question));
            if !unchanged {
                overrides.insert(question.id.clone(), question.clone());
                applied_count += 1;
            }
        } else if options.merge_with_existing {
            overrides.shift_remove(&question.id);
        }
    }

    let (progress, review) = match (&data, options.include_state) {
        (Value::Object(obj), true) => (
            obj.get("progress").cloned().map(ProgressState::from_value),
            obj.get("review").cloned().map(ReviewState::from_value),
        ),
        _ => (None, None),
    };

    log::info!(
        "Processed import: {} valid, {} applied, {} invalid",
        valid.len(),
        applied_count,
        invalid_items.len()
    );

    Ok(ImportResult {
        overrides,
        progress,
        review,
        valid_count: valid.len(),
        applied_count,
        invalid_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::schema::tests::schema_json;
    use serde_json::json;

    fn core_bank() -> Vec<Question> {
        vec![validate_item(&schema_json("CORE-1"), 0).unwrap()]
    }

    #[test]
    fn test_invalid_items_do_not_block_valid_ones() {
        let mut bad = schema_json("BAD");
        bad["options"] = json!(["only one"]);
        let raw = json!([schema_json("NEW-1"), bad, { "nonsense": true }]).to_string();

        let result = process_import(&raw, ImportOptions::default(), &core_bank(), &OverrideMap::new()).unwrap();
        assert_eq!(result.valid_count, 1);
        assert_eq!(result.applied_count, 1);
        assert_eq!(result.invalid_items.len(), 2);
        assert_eq!(result.invalid_items[0].id, "BAD");
        assert_eq!(result.invalid_items[1].id, "item-3");
        assert!(result.overrides.contains_key("NEW-1"));
    }

    #[test]
    fn test_identical_to_core_is_not_stored() {
        let raw = json!([schema_json("CORE-1")]).to_string();
        let result = process_import(&raw, ImportOptions::default(), &core_bank(), &OverrideMap::new()).unwrap();

        assert_eq!(result.valid_count, 1);
        assert_eq!(result.applied_count, 0);
        assert!(result.overrides.is_empty());
    }

    #[test]
    fn test_merge_restores_core_version() {
        let mut changed = validate_item(&schema_json("CORE-1"), 0).unwrap();
        changed.prompt = "Edited locally".to_string();
        let mut current = OverrideMap::new();
        current.insert("CORE-1".to_string(), changed);
        current.insert("KEEP".to_string(), validate_item(&schema_json("KEEP"), 0).unwrap());

        let raw = json!([schema_json("CORE-1")]).to_string();
        let options = ImportOptions {
            merge_with_existing: true,
            ..Default::default()
        };
        let result = process_import(&raw, options, &core_bank(), &current).unwrap();

        assert!(!result.overrides.contains_key("CORE-1"));
        assert!(result.overrides.contains_key("KEEP"));
    }

    #[test]
    fn test_replace_mode_drops_existing_overrides() {
        let mut current = OverrideMap::new();
        current.insert("OLD".to_string(), validate_item(&schema_json("OLD"), 0).unwrap());

        let raw = json!([schema_json("NEW-1")]).to_string();
        let result = process_import(&raw, ImportOptions::default(), &core_bank(), &current).unwrap();

        assert_eq!(result.overrides.keys().collect::<Vec<_>>(), vec!["NEW-1"]);
    }

    #[test]
    fn test_unchanged_override_not_counted() {
        let mut current = OverrideMap::new();
        current.insert("NEW-1".to_string(), validate_item(&schema_json("NEW-1"), 0).unwrap());

        let raw = json!([schema_json("NEW-1")]).to_string();
        let options = ImportOptions {
            merge_with_existing: true,
            ..Default::default()
        };
        let result = process_import(&raw, options, &core_bank(), &current).unwrap();
        assert_eq!(result.applied_count, 0);
        assert_eq!(result.overrides.len(), 1);
    }

    #[test]
    fn test_payload_with_state() {
        let raw = json!({
            "format": "chd-qbank",
            "questions": [schema_json("NEW-1")],
            "progress": { "questions": { "NEW-1": { "attempts": 3, "correct": 1 } }, "quizHistory": [] },
            "review": { "items": { "NEW-1": { "interval": 6, "repetition": 2, "ease": 2.5, "due": 0 } } }
        })
        .to_string();

        let with_state = ImportOptions {
            include_state: true,
            ..Default::default()
        };
        let result = process_import(&raw, with_state, &core_bank(), &OverrideMap::new()).unwrap();
        assert_eq!(result.progress.unwrap().stats("NEW-1").unwrap().attempts, 3);
        assert_eq!(result.review.unwrap().get("NEW-1").unwrap().interval, 6);

        let without_state = process_import(&raw, ImportOptions::default(), &core_bank(), &OverrideMap::new()).unwrap();
        assert!(without_state.progress.is_none());
        assert!(without_state.review.is_none());
    }

    #[test]
    fn test_bad_documents() {
        let core = core_bank();
        let none = OverrideMap::new();
        assert!(matches!(
            process_import("{\"items\": []}", ImportOptions::default(), &core, &none),
            Err(InterchangeError::UnexpectedShape)
        ));
        assert!(matches!(
            process_import("42", ImportOptions::default(), &core, &none),
            Err(InterchangeError::UnexpectedShape)
        ));
        assert!(matches!(
            process_import("[", ImportOptions::default(), &core, &none),
            Err(InterchangeError::Json(_))
        ));
    }

    #[test]
    fn test_summary_text() {
        let raw = json!([schema_json("NEW-1"), {}]).to_string();
        let result = process_import(&raw, ImportOptions::default(), &core_bank(), &OverrideMap::new()).unwrap();
        assert_eq!(
            result.to_string(),
            "1 items loaded (1 overrides applied) \u{2022} 1 invalid"
        );
    }
}
