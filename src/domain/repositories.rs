//! Repository trait definitions.
//!
//! Implementations live in `crate::store`.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use entity::{achievement, activity, activity_category, user, user_achievement};

use super::{AchievementRecord, ActivityRecord, NewUser, ProgressWrite};
use crate::AppError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: i32) -> Result<Option<user::Model>, AppError>;

    async fn create_user(&self, input: NewUser, now: NaiveDateTime)
        -> Result<user::Model, AppError>;

    /// Overwrite the stored footprint and score.
    async fn update_aggregate(
        &self,
        user_id: i32,
        carbon_footprint: f64,
        score: i32,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError>;

    /// Add `delta` to the user's score and return the new score.
    async fn add_score(&self, user_id: i32, delta: i32) -> Result<i32, AppError>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<activity_category::Model>, AppError>;

    async fn find_category(&self, id: i32) -> Result<Option<activity_category::Model>, AppError>;

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<activity_category::Model>, AppError>;

    async fn insert_activity(
        &self,
        record: ActivityRecord,
        now: NaiveDateTime,
    ) -> Result<activity::Model, AppError>;

    /// Newest first.
    async fn list_activities(&self, user_id: i32) -> Result<Vec<activity::Model>, AppError>;

    async fn count_activities(
        &self,
        user_id: i32,
        category_id: Option<i32>,
    ) -> Result<u64, AppError>;

    /// Dates of the user's activities up to and including `until`.
    async fn activity_dates(
        &self,
        user_id: i32,
        until: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>, AppError>;

    /// Signed carbon amounts of the user's activities, optionally limited to
    /// `[start, end)`.
    async fn carbon_amounts(
        &self,
        user_id: i32,
        range: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<Vec<f64>, AppError>;
}

#[async_trait]
pub trait AchievementRepository: Send + Sync {
    async fn list_achievements(&self) -> Result<Vec<achievement::Model>, AppError>;

    async fn create_achievement(
        &self,
        record: AchievementRecord,
        now: NaiveDateTime,
    ) -> Result<achievement::Model, AppError>;

    async fn find_progress(
        &self,
        user_id: i32,
        achievement_id: i32,
    ) -> Result<Option<user_achievement::Model>, AppError>;

    async fn list_progress(&self, user_id: i32)
        -> Result<Vec<user_achievement::Model>, AppError>;

    async fn insert_progress(
        &self,
        write: ProgressWrite,
    ) -> Result<user_achievement::Model, AppError>;

    async fn update_progress(
        &self,
        id: i32,
        write: ProgressWrite,
    ) -> Result<user_achievement::Model, AppError>;

    async fn count_completed(&self, user_id: i32) -> Result<u64, AppError>;
}

/// Everything the engine needs from a storage backend.
pub trait Store: UserRepository + ActivityRepository + AchievementRepository {}

impl<T> Store for T where T: UserRepository + ActivityRepository + AchievementRepository {}
