//! Question bank for the CHD study tool
//!
//! This module provides:
//! - The question model (lesion, classification, category, difficulty, options)
//! - Normalization of user-authored and imported questions
//! - Merging the shipped core bank with local overrides
//! - Study filters over the merged bank

pub mod filter;
pub mod merge;
pub mod models;

pub use filter::{filter_bank, lesions, LesionEntry, StudyFilter};
pub use merge::{build_bank, decode_overrides, OverrideMap, OverrideSummary};
pub use models::*;
