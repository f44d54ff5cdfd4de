//! Data models for the review queue

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ease factor given to newly queued items
pub const DEFAULT_EASE: f64 = 2.5;
/// Minimum ease factor allowed
pub const MIN_EASE: f64 = 1.3;

fn default_ease() -> f64 {
    DEFAULT_EASE
}

/// Scheduling state for one question under review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Current interval in days
    #[serde(default)]
    pub interval: u32,
    /// Consecutive successful reviews
    #[serde(default)]
    pub repetition: u32,
    /// SM-2 ease factor (default 2.5)
    #[serde(default = "default_ease")]
    pub ease: f64,
    /// When the item is next due
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due: DateTime<Utc>,
    /// Quality (0-5) of the most recent review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_quality: Option<u8>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_queued: Option<DateTime<Utc>>,
}

impl ReviewItem {
    /// A freshly queued item, due immediately
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            interval: 0,
            repetition: 0,
            ease: DEFAULT_EASE,
            due: now,
            last_quality: None,
            last_reviewed: None,
            last_queued: Some(now),
        }
    }

    /// Check if the item is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }
}

/// The persisted review map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    #[serde(default)]
    pub items: IndexMap<String, ReviewItem>,
}

#[derive(Deserialize)]
struct RawReviewState {
    #[serde(default)]
    items: IndexMap<String, Value>,
}

impl ReviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode stored review data. Unreadable items are dropped with a
    /// warning; an unreadable document yields an empty map.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                log::warn!("Unable to parse stored review data: {}", e);
                Self::default()
            }
        }
    }

    /// Same as [`ReviewState::decode`] for an already parsed document
    pub fn from_value(value: Value) -> Self {
        let parsed: RawReviewState = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Unable to read review data: {}", e);
                return Self::default();
            }
        };

        let mut state = Self::default();
        for (id, value) in parsed.items {
            match serde_json::from_value::<ReviewItem>(value) {
                Ok(item) => {
                    state.items.insert(id, item);
                }
                Err(e) => log::warn!("Dropping unreadable review item '{}': {}", id, e),
            }
        }
        state
    }

    pub fn get(&self, question_id: &str) -> Option<&ReviewItem> {
        self.items.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Due and scheduled counts for the review panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatus {
    /// Items whose due time has passed
    pub due: usize,
    /// All items in the review map
    pub scheduled: usize,
}

/// Outcome of grading a review item
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewUpdate {
    /// The item was rescheduled
    Scheduled(ReviewItem),
    /// The question no longer exists; its item was removed
    Purged,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_item_is_due_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let item = ReviewItem::new(now);
        assert_eq!(item.interval, 0);
        assert_eq!(item.repetition, 0);
        assert_eq!(item.ease, DEFAULT_EASE);
        assert!(item.is_due(now));
        assert_eq!(item.last_queued, Some(now));
    }

    #[test]
    fn test_wire_format_uses_millis() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut state = ReviewState::new();
        state.items.insert("Q1".to_string(), ReviewItem::new(now));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["items"]["Q1"]["due"], now.timestamp_millis());
        assert_eq!(value["items"]["Q1"]["lastQueued"], now.timestamp_millis());
        assert!(value["items"]["Q1"].get("lastQuality").is_none());
    }

    #[test]
    fn test_decode_drops_bad_items() {
        let raw = r#"{
            "items": {
                "Q1": { "interval": 6, "repetition": 2, "ease": 2.6, "due": 1735689600000 },
                "Q2": { "interval": "soon" },
                "Q3": { "due": 1735689600000 }
            }
        }"#;

        let state = ReviewState::decode(raw);
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("Q1").unwrap().interval, 6);
        assert_eq!(state.get("Q3").unwrap().ease, DEFAULT_EASE);
        assert!(state.get("Q2").is_none());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(ReviewState::decode("[]").is_empty());
        assert!(ReviewState::decode("").is_empty());
    }
}
