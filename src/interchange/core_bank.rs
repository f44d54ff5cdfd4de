//! Strict loading of the shipped core bank

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::schema::validate_item;
use super::{InterchangeError, Result};
use crate::bank::Question;

/// Parse the core bank document. Unlike imports, any invalid item or
/// duplicate id rejects the whole bank.
pub fn parse_core_bank(raw: &str) -> Result<Vec<Question>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(InterchangeError::UnexpectedShape);
    };

    let mut questions = Vec::with_capacity(items.len());
    let mut invalid = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match validate_item(item, index) {
            Ok(question) => questions.push(question),
            Err(problem) => invalid.push(problem),
        }
    }
    if !invalid.is_empty() {
        return Err(InterchangeError::InvalidQuestions(invalid));
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for question in &questions {
        if !seen.insert(question.id.as_str()) {
            duplicates.push(question.id.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(InterchangeError::DuplicateIds(duplicates));
    }

    Ok(questions)
}

/// Read and parse the core bank file
pub fn load_core_bank(path: &Path) -> Result<Vec<Question>> {
    let raw = fs::read_to_string(path)?;
    let questions = parse_core_bank(&raw)?;
    log::info!("Loaded core bank from {:?} ({} questions)", path, questions.len());
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::schema::tests::schema_json;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_valid_bank() {
        let raw = json!([schema_json("Q1"), schema_json("Q2")]).to_string();
        let bank = parse_core_bank(&raw).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[1].id, "Q2");
    }

    #[test]
    fn test_any_invalid_item_fails_the_bank() {
        let mut bad = schema_json("Q2");
        bad["difficulty"] = json!(0);
        let raw = json!([schema_json("Q1"), bad]).to_string();

        match parse_core_bank(&raw) {
            Err(InterchangeError::InvalidQuestions(items)) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].id, "Q2");
            }
            other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_duplicate_ids_fail_the_bank() {
        let raw = json!([schema_json("Q1"), schema_json("Q1")]).to_string();
        assert!(matches!(
            parse_core_bank(&raw),
            Err(InterchangeError::DuplicateIds(ids)) if ids == vec!["Q1".to_string()]
        ));
    }

    #[test]
    fn test_non_array_rejected() {
        assert!(matches!(
            parse_core_bank("{\"questions\": []}"),
            Err(InterchangeError::UnexpectedShape)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("questions.v1.json");
        fs::write(&path, json!([schema_json("Q1")]).to_string()).unwrap();

        let bank = load_core_bank(&path).unwrap();
        assert_eq!(bank.len(), 1);

        assert!(matches!(
            load_core_bank(&temp.path().join("missing.json")),
            Err(InterchangeError::Io(_))
        ));
    }
}
