pub mod bank;
pub mod export;
pub mod import;
pub mod overrides;
pub mod quiz;
pub mod reset;
pub mod review;
pub mod stats;
pub mod study;
