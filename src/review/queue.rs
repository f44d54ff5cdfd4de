//! Due-queue selection
//!
//! Selection never mutates the review map while walking it: a sorted
//! snapshot is taken, entries whose question is gone are collected into a
//! pending-delete list, and the caller applies those deletions afterwards.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::models::{ReviewItem, ReviewStatus};

/// Result of scanning the review map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSelection {
    /// Question to present next, if any live item exists
    pub next: Option<String>,
    /// Whether `next` is actually due (false when falling back to the earliest item)
    pub due_now: bool,
    /// Entries whose question no longer exists
    pub purge: Vec<String>,
}

/// Pick the next item to review.
///
/// Items are ordered by due time (ties keep map order). The first live item
/// that is due wins; with nothing due, the earliest live item is returned so a
/// session never runs dry while items remain.
pub fn select_next<F>(items: &IndexMap<String, ReviewItem>, is_live: F, now: DateTime<Utc>) -> QueueSelection
where
    F: Fn(&str) -> bool,
{
    let mut snapshot: Vec<(&String, &ReviewItem)> = items.iter().collect();
    snapshot.sort_by_key(|(_, item)| item.due);

    let mut purge = Vec::new();
    let mut live = Vec::with_capacity(snapshot.len());
    for (id, item) in snapshot {
        if is_live(id) {
            live.push((id, item));
        } else {
            purge.push(id.clone());
        }
    }

    let due = live.iter().find(|(_, item)| item.is_due(now));
    let (next, due_now) = match due {
        Some((id, _)) => (Some((*id).clone()), true),
        None => (live.first().map(|(id, _)| (*id).clone()), false),
    };

    QueueSelection { next, due_now, purge }
}

/// Count due and scheduled items
pub fn review_status(items: &IndexMap<String, ReviewItem>, now: DateTime<Utc>) -> ReviewStatus {
    ReviewStatus {
        due: items.values().filter(|item| item.is_due(now)).count(),
        scheduled: items.len(),
    }
}
