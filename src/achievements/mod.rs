//! Achievement engine: progress metrics and the per-user rule evaluator.

pub mod metrics;
pub mod processor;

pub use processor::{AchievementProcessor, EvaluationSummary, UserLock, COMPLETION_POINTS};
