//! Spaced repetition review for the question bank
//!
//! This module provides:
//! - Review items and the persisted review map
//! - SM-2 scheduling of the next due date
//! - Due-queue selection with lazy removal of dead entries
//! - The review session state machine

pub mod algorithm;
pub mod models;
pub mod queue;
pub mod session;

pub use algorithm::{format_interval, preview_intervals, schedule};
pub use models::*;
pub use queue::{review_status, select_next, QueueSelection};
pub use session::{PresentedOption, ReviewCard, ReviewSession, SessionError, SessionState};
