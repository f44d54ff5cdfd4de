pub mod bank;
pub mod config;
pub mod context;
pub mod interchange;
pub mod progress;
pub mod quiz;
pub mod review;
pub mod storage;

pub use config::Config;
pub use context::{AnswerFeedback, OverrideError, StudyContext};
