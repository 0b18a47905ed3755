//! Achievement rule evaluator.
//!
//! Walks the whole catalog for one user, recomputes progress for every
//! achievement the user has not completed yet, stores it, and awards
//! [`COMPLETION_POINTS`] on the first completion. A failing achievement is
//! logged and does not stop the others.

use std::sync::Arc;

use async_graphql::SimpleObject;
use chrono::{Local, NaiveDateTime};
use dashmap::DashMap;
use entity::achievement;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::metrics;
use crate::domain::{ProgressWrite, Store, ThresholdType};
use crate::AppError;

/// Points added to a user's score the first time an achievement completes.
pub const COMPLETION_POINTS: i32 = 50;

#[derive(Debug, Default, Clone, PartialEq, Eq, SimpleObject)]
pub struct EvaluationSummary {
    /// Achievements whose progress was recomputed and stored.
    pub evaluated: u32,
    pub newly_completed: u32,
    pub already_completed: u32,
    /// Catalog entries with a threshold type the engine does not know.
    pub skipped: u32,
    pub failed: u32,
    pub points_awarded: i32,
}

enum Outcome {
    AlreadyCompleted,
    UnknownThreshold,
    Evaluated { newly_completed: bool },
}

pub struct AchievementProcessor {
    store: Arc<dyn Store>,
    // Evaluation reads then writes progress rows and the score; two runs for
    // the same user must not interleave or both could award one completion.
    user_locks: DashMap<i32, Arc<Mutex<()>>>,
}

/// Exclusive hold on one user's achievement state. The lock entry is dropped
/// from the map once nobody else holds or waits on it.
pub struct UserLock<'a> {
    user_id: i32,
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<i32, Arc<Mutex<()>>>,
}

impl UserLock<'_> {
    pub fn user_id(&self) -> i32 {
        self.user_id
    }
}

impl Drop for UserLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl AchievementProcessor {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            user_locks: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `user_id`'s score and progress rows.
    pub async fn lock_user(&self, user_id: i32) -> UserLock<'_> {
        let lock = self.user_locks.entry(user_id).or_default().clone();
        UserLock {
            user_id,
            guard: Some(lock.lock_owned().await),
            locks: &self.user_locks,
        }
    }

    pub async fn process_for_user(&self, user_id: i32) -> Result<EvaluationSummary, AppError> {
        self.process_for_user_at(user_id, Local::now().naive_local())
            .await
    }

    /// Same as [`process_for_user`](Self::process_for_user) with an explicit
    /// local "now".
    pub async fn process_for_user_at(
        &self,
        user_id: i32,
        now: NaiveDateTime,
    ) -> Result<EvaluationSummary, AppError> {
        let lock = self.lock_user(user_id).await;
        self.process_locked(&lock, now).await
    }

    /// Evaluate the catalog for the user `lock` is held for.
    pub async fn process_locked(
        &self,
        lock: &UserLock<'_>,
        now: NaiveDateTime,
    ) -> Result<EvaluationSummary, AppError> {
        let user_id = lock.user_id();
        let catalog = self.store.list_achievements().await?;
        let mut summary = EvaluationSummary::default();

        for achievement in &catalog {
            match self.evaluate(user_id, achievement, now).await {
                Ok(Outcome::AlreadyCompleted) => summary.already_completed += 1,
                Ok(Outcome::UnknownThreshold) => summary.skipped += 1,
                Ok(Outcome::Evaluated { newly_completed }) => {
                    summary.evaluated += 1;
                    if newly_completed {
                        summary.newly_completed += 1;
                        summary.points_awarded += COMPLETION_POINTS;
                    }
                }
                Err(err) => {
                    error!(
                        achievement = %achievement.name,
                        user_id,
                        error = %err,
                        "Failed to evaluate achievement"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            user_id,
            evaluated = summary.evaluated,
            newly_completed = summary.newly_completed,
            failed = summary.failed,
            "Processed achievements"
        );
        Ok(summary)
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.user_locks.len()
    }

    async fn evaluate(
        &self,
        user_id: i32,
        achievement: &achievement::Model,
        now: NaiveDateTime,
    ) -> Result<Outcome, AppError> {
        let existing = self.store.find_progress(user_id, achievement.id).await?;
        if existing.as_ref().is_some_and(|row| row.is_completed) {
            return Ok(Outcome::AlreadyCompleted);
        }

        let threshold_type = match achievement.threshold_type.parse::<ThresholdType>() {
            Ok(threshold_type) => threshold_type,
            Err(err) => {
                warn!(achievement = %achievement.name, "{err}, skipping");
                return Ok(Outcome::UnknownThreshold);
            }
        };

        let progress =
            metrics::compute_progress(self.store.as_ref(), threshold_type, user_id, now).await?;
        let is_completed = progress >= achievement.threshold_value;
        // Only set once the achievement is actually earned.
        let date_earned = existing
            .as_ref()
            .and_then(|row| row.date_earned)
            .or(is_completed.then_some(now));

        let write = ProgressWrite {
            user_id,
            achievement_id: achievement.id,
            progress,
            is_completed,
            date_earned,
            now,
        };
        match existing {
            Some(row) => self.store.update_progress(row.id, write).await?,
            None => self.store.insert_progress(write).await?,
        };
        debug!(
            achievement = %achievement.name,
            user_id,
            progress,
            threshold = achievement.threshold_value,
            "Stored achievement progress"
        );

        // `existing` was absent or incomplete, so this is the first completion.
        if is_completed {
            let score = self.store.add_score(user_id, COMPLETION_POINTS).await?;
            info!(
                achievement = %achievement.name,
                user_id,
                score,
                "Achievement completed"
            );
        }

        Ok(Outcome::Evaluated {
            newly_completed: is_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn lock_entries_are_released_after_use() {
        let processor = AchievementProcessor::new(Arc::new(InMemoryStore::new()));

        let lock = processor.lock_user(7).await;
        assert_eq!(processor.tracked_users(), 1);
        drop(lock);
        assert_eq!(processor.tracked_users(), 0);

        processor.process_for_user(7).await.unwrap();
        assert_eq!(processor.tracked_users(), 0);
    }
}
