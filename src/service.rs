//! User aggregate commands.
//!
//! Logging an activity always runs in the same order: store the activity,
//! recompute the footprint, recompute the score, then evaluate achievements.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::SimpleObject;
use chrono::{Local, NaiveDateTime};
use entity::{achievement, activity, user};
use tracing::{info, warn};

use crate::achievements::{
    AchievementProcessor, EvaluationSummary, UserLock, COMPLETION_POINTS,
};
use crate::carbon;
use crate::domain::{ActivityRecord, NewActivity, NewUser, Store};
use crate::AppError;

pub const DEFAULT_SCORE_BASELINE: f64 = 1000.0;

#[derive(Debug, Clone, SimpleObject)]
pub struct LoggedActivity {
    pub activity: activity::Model,
    /// User after footprint, score and achievements were updated.
    pub user: user::Model,
    /// `None` when achievement processing failed; the activity is stored
    /// regardless.
    pub achievements: Option<EvaluationSummary>,
}

/// An achievement from the catalog with the user's progress on it.
#[derive(Debug, Clone, SimpleObject)]
pub struct AchievementProgress {
    pub achievement: achievement::Model,
    pub progress: f64,
    pub is_completed: bool,
    pub date_earned: Option<NaiveDateTime>,
}

pub struct UserAggregateService {
    store: Arc<dyn Store>,
    processor: AchievementProcessor,
    score_baseline: f64,
}

impl UserAggregateService {
    pub fn new(store: Arc<dyn Store>, score_baseline: f64) -> Self {
        Self {
            processor: AchievementProcessor::new(store.clone()),
            store,
            score_baseline,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn processor(&self) -> &AchievementProcessor {
        &self.processor
    }

    pub async fn create_user(&self, input: NewUser) -> Result<user::Model, AppError> {
        if input.username.trim().is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }
        if !input.email.contains('@') {
            return Err(AppError::Validation(format!(
                "'{}' is not an email address",
                input.email
            )));
        }
        let now = Local::now().naive_local();
        let user = self.store.create_user(input, now).await?;
        info!(user_id = user.id, username = %user.username, "Created user");
        // start from the baseline score
        self.recompute_aggregate(user.id, now).await
    }

    pub async fn log_activity(
        &self,
        user_id: i32,
        input: NewActivity,
    ) -> Result<LoggedActivity, AppError> {
        self.log_activity_at(user_id, input, Local::now().naive_local())
            .await
    }

    pub async fn log_activity_at(
        &self,
        user_id: i32,
        input: NewActivity,
        now: NaiveDateTime,
    ) -> Result<LoggedActivity, AppError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(AppError::not_found(format!("user {user_id}")));
        }
        let category = self
            .store
            .find_category(input.category_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("category {}", input.category_id)))?;

        let carbon_amount = match (input.carbon_amount, input.activity_type.as_deref()) {
            (Some(amount), _) if amount.is_finite() => amount,
            (Some(amount), _) => {
                return Err(AppError::Validation(format!(
                    "carbon amount must be finite, got {amount}"
                )))
            }
            (None, Some(activity_type)) => carbon::estimate(
                &category.name,
                activity_type,
                input.quantity.unwrap_or(1.0),
            )?,
            (None, None) => {
                return Err(AppError::Validation(
                    "either carbonAmount or activityType is required".to_string(),
                ))
            }
        };

        let activity = self
            .store
            .insert_activity(
                ActivityRecord {
                    user_id,
                    category_id: category.id,
                    description: input.description,
                    carbon_amount,
                    date: input.date.unwrap_or(now),
                },
                now,
            )
            .await?;
        info!(
            user_id,
            activity_id = activity.id,
            category = %category.name,
            carbon_amount,
            "Logged activity"
        );

        // Recompute and evaluation form one critical section, otherwise a
        // concurrent award could land between reading and writing the score.
        let lock = self.processor.lock_user(user_id).await;
        self.recompute_locked(&lock, now).await?;

        let achievements = match self.processor.process_locked(&lock, now).await {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(user_id, error = %err, "Achievement processing failed");
                None
            }
        };
        drop(lock);

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;

        Ok(LoggedActivity {
            activity,
            user,
            achievements,
        })
    }

    /// Recompute footprint and score from the stored activities and
    /// completed achievements.
    pub async fn recompute_aggregate(
        &self,
        user_id: i32,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError> {
        let lock = self.processor.lock_user(user_id).await;
        self.recompute_locked(&lock, now).await
    }

    async fn recompute_locked(
        &self,
        lock: &UserLock<'_>,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError> {
        let user_id = lock.user_id();
        let footprint: f64 = self
            .store
            .carbon_amounts(user_id, None)
            .await?
            .iter()
            .sum();
        let completed = self.store.count_completed(user_id).await?;
        let bonus = i32::try_from(completed)
            .ok()
            .and_then(|c| c.checked_mul(COMPLETION_POINTS))
            .ok_or_else(|| {
                AppError::Internal(format!("{completed} completions overflow the score"))
            })?;
        let score = footprint_score(footprint, self.score_baseline).saturating_add(bonus);

        self.store
            .update_aggregate(user_id, footprint, score, now)
            .await
    }

    pub async fn process_achievements(
        &self,
        user_id: i32,
    ) -> Result<EvaluationSummary, AppError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(AppError::not_found(format!("user {user_id}")));
        }
        self.processor.process_for_user(user_id).await
    }

    /// Whole catalog, with progress 0 for achievements not tracked yet.
    pub async fn user_achievements(
        &self,
        user_id: i32,
    ) -> Result<Vec<AchievementProgress>, AppError> {
        let mut progress: HashMap<i32, _> = self
            .store
            .list_progress(user_id)
            .await?
            .into_iter()
            .map(|row| (row.achievement_id, row))
            .collect();

        Ok(self
            .store
            .list_achievements()
            .await?
            .into_iter()
            .map(|achievement| match progress.remove(&achievement.id) {
                Some(row) => AchievementProgress {
                    achievement,
                    progress: row.progress,
                    is_completed: row.is_completed,
                    date_earned: row.date_earned,
                },
                None => AchievementProgress {
                    achievement,
                    progress: 0.0,
                    is_completed: false,
                    date_earned: None,
                },
            })
            .collect())
    }
}

/// Score earned by staying under `baseline` kg CO2e.
pub fn footprint_score(footprint: f64, baseline: f64) -> i32 {
    let score = (baseline - footprint).max(0.0).round();
    if score >= i32::MAX as f64 {
        i32::MAX
    } else {
        score as i32
    }
}
