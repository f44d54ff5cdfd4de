//! SM-2 Spaced Repetition Algorithm
//!
//! Variant of the SuperMemo 2 algorithm used to schedule review items.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation
//!
//! A lapse (quality below 3) collapses the item back to a one day interval
//! and leaves the ease factor alone.

use chrono::{DateTime, Duration, Utc};

use super::models::{ReviewItem, MIN_EASE};

/// Milliseconds in one scheduling day
pub const DAY_MS: i64 = 86_400_000;

/// Intervals are capped so due dates stay representable
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Lowest quality that counts as a successful recall
pub const PASSING_QUALITY: u8 = 3;

/// Compute the next state of an item graded with `quality`.
///
/// Pure: the caller decides whether to store the result.
pub fn schedule(item: &ReviewItem, quality: u8, now: DateTime<Utc>) -> ReviewItem {
    // Clamp quality to valid range
    let quality = quality.min(5);

    let mut next = item.clone();

    if quality < PASSING_QUALITY {
        next.repetition = 0;
        next.interval = 1;
    } else {
        next.repetition = item.repetition.saturating_add(1);
        next.interval = match next.repetition {
            1 => 1,
            2 => 6,
            _ => grown_interval(item.interval, item.ease),
        };

        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let miss = f64::from(5 - quality);
        next.ease = (item.ease + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE);
    }

    next.last_quality = Some(quality);
    next.last_reviewed = Some(now);
    next.due = now + Duration::milliseconds(i64::from(next.interval) * DAY_MS);

    next
}

fn grown_interval(interval: u32, ease: f64) -> u32 {
    let grown = (f64::from(interval) * ease).round();
    if grown >= f64::from(MAX_INTERVAL_DAYS) {
        MAX_INTERVAL_DAYS
    } else if grown <= 0.0 {
        0
    } else {
        grown as u32
    }
}

/// Interval each quality rating (index 0-5) would produce
pub fn preview_intervals(item: &ReviewItem, now: DateTime<Utc>) -> [u32; 6] {
    let mut intervals = [0; 6];
    for (quality, slot) in intervals.iter_mut().enumerate() {
        *slot = schedule(item, quality as u8, now).interval;
    }
    intervals
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
