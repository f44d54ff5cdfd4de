//! Bulk question interchange
//!
//! The external schema is the one shipped in `questions.v1.json`: flat
//! question objects with string options and an answer index, index set or
//! boolean depending on the question type. This module converts between that
//! schema and [`Question`](crate::bank::Question), validates items one by
//! one, and builds import results and export payloads.

mod core_bank;
mod export;
mod import;
pub(crate) mod schema;

use thiserror::Error;

pub use core_bank::{load_core_bank, parse_core_bank};
pub use export::{build_export, ExportPayload, EXPORT_FORMAT, EXPORT_VERSION};
pub use import::{process_import, ImportOptions, ImportResult};
pub use schema::{from_schema, questions_equal, to_schema, validate_item, InvalidItem, SchemaQuestion, Topic};

#[derive(Error, Debug)]
pub enum InterchangeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected an array of questions or an object with a \"questions\" array")]
    UnexpectedShape,

    #[error("Question validation failed for {} item(s): {}", .0.len(), describe_invalid(.0))]
    InvalidQuestions(Vec<InvalidItem>),

    #[error("Duplicate question ids detected: {}", .0.join(", "))]
    DuplicateIds(Vec<String>),
}

fn describe_invalid(items: &[InvalidItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({})", item.id, item.errors.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, InterchangeError>;
