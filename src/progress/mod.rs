//! Attempt recording
//!
//! Per-question answer statistics plus a global quiz history, both with
//! bounded ring buffers.

mod models;

pub use models::*;
