//! Export payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::{to_schema, SchemaQuestion};
use crate::bank::Question;
use crate::progress::ProgressState;
use crate::review::ReviewState;

pub const EXPORT_FORMAT: &str = "chd-qbank";
pub const EXPORT_VERSION: &str = "v1";

/// Full snapshot of the merged bank and local state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub exported_at: DateTime<Utc>,
    pub format: String,
    pub version: String,
    pub core_size: usize,
    pub questions: Vec<SchemaQuestion>,
    pub progress: ProgressState,
    pub review: ReviewState,
}

pub fn build_export(
    core_size: usize,
    bank: &[Question],
    progress: &ProgressState,
    review: &ReviewState,
    now: DateTime<Utc>,
) -> ExportPayload {
    ExportPayload {
        exported_at: now,
        format: EXPORT_FORMAT.to_string(),
        version: EXPORT_VERSION.to_string(),
        core_size,
        questions: bank.iter().map(to_schema).collect(),
        progress: progress.clone(),
        review: review.clone(),
    }
}
