//! Lock-guarded in-memory backend, used by tests and local runs without a
//! database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use entity::{achievement, activity, activity_category, user, user_achievement};

use crate::domain::{
    AchievementRecord, AchievementRepository, ActivityRecord, ActivityRepository, NewUser,
    ProgressWrite, UserRepository,
};
use crate::AppError;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i32, user::Model>,
    categories: BTreeMap<i32, activity_category::Model>,
    activities: Vec<activity::Model>,
    achievements: BTreeMap<i32, achievement::Model>,
    progress: HashMap<(i32, i32), user_achievement::Model>,
    last_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }

    pub fn insert_category(
        &self,
        name: &str,
        description: &str,
        icon: &str,
    ) -> Result<activity_category::Model, AppError> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.name == name) {
            return Err(AppError::Validation(format!(
                "category '{name}' already exists"
            )));
        }
        let category = activity_category::Model {
            id: state.next_id(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, id: i32) -> Result<Option<user::Model>, AppError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn create_user(
        &self,
        input: NewUser,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError> {
        let mut state = self.write()?;
        if state
            .users
            .values()
            .any(|u| u.username == input.username || u.email == input.email)
        {
            return Err(AppError::Validation(
                "username or email already taken".to_string(),
            ));
        }
        let user = user::Model {
            id: state.next_id(),
            username: input.username,
            email: input.email,
            name: input.name,
            carbon_footprint: 0.0,
            score: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_aggregate(
        &self,
        user_id: i32,
        carbon_footprint: f64,
        score: i32,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError> {
        let mut state = self.write()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;
        user.carbon_footprint = carbon_footprint;
        user.score = score;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn add_score(&self, user_id: i32, delta: i32) -> Result<i32, AppError> {
        let mut state = self.write()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;
        user.score += delta;
        Ok(user.score)
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<activity_category::Model>, AppError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: i32) -> Result<Option<activity_category::Model>, AppError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<activity_category::Model>, AppError> {
        Ok(self
            .read()?
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert_activity(
        &self,
        record: ActivityRecord,
        now: NaiveDateTime,
    ) -> Result<activity::Model, AppError> {
        let mut state = self.write()?;
        let activity = activity::Model {
            id: state.next_id(),
            user_id: record.user_id,
            category_id: record.category_id,
            description: record.description,
            carbon_amount: record.carbon_amount,
            date: record.date,
            created_at: now,
        };
        state.activities.push(activity.clone());
        Ok(activity)
    }

    async fn list_activities(&self, user_id: i32) -> Result<Vec<activity::Model>, AppError> {
        let mut activities: Vec<activity::Model> = self
            .read()?
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(activities)
    }

    async fn count_activities(
        &self,
        user_id: i32,
        category_id: Option<i32>,
    ) -> Result<u64, AppError> {
        let count = self
            .read()?
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| category_id.map_or(true, |c| a.category_id == c))
            .count();
        Ok(count as u64)
    }

    async fn activity_dates(
        &self,
        user_id: i32,
        until: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>, AppError> {
        Ok(self
            .read()?
            .activities
            .iter()
            .filter(|a| a.user_id == user_id && a.date <= until)
            .map(|a| a.date)
            .collect())
    }

    async fn carbon_amounts(
        &self,
        user_id: i32,
        range: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<Vec<f64>, AppError> {
        Ok(self
            .read()?
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| range.map_or(true, |(start, end)| a.date >= start && a.date < end))
            .map(|a| a.carbon_amount)
            .collect())
    }
}

#[async_trait]
impl AchievementRepository for InMemoryStore {
    async fn list_achievements(&self) -> Result<Vec<achievement::Model>, AppError> {
        Ok(self.read()?.achievements.values().cloned().collect())
    }

    async fn create_achievement(
        &self,
        record: AchievementRecord,
        now: NaiveDateTime,
    ) -> Result<achievement::Model, AppError> {
        let mut state = self.write()?;
        let achievement = achievement::Model {
            id: state.next_id(),
            name: record.name,
            description: record.description,
            icon: record.icon,
            threshold_type: record.threshold_type,
            threshold_value: record.threshold_value,
            created_at: now,
            updated_at: now,
        };
        state.achievements.insert(achievement.id, achievement.clone());
        Ok(achievement)
    }

    async fn find_progress(
        &self,
        user_id: i32,
        achievement_id: i32,
    ) -> Result<Option<user_achievement::Model>, AppError> {
        Ok(self
            .read()?
            .progress
            .get(&(user_id, achievement_id))
            .cloned())
    }

    async fn list_progress(
        &self,
        user_id: i32,
    ) -> Result<Vec<user_achievement::Model>, AppError> {
        let mut rows: Vec<user_achievement::Model> = self
            .read()?
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.achievement_id);
        Ok(rows)
    }

    async fn insert_progress(
        &self,
        write: ProgressWrite,
    ) -> Result<user_achievement::Model, AppError> {
        let mut state = self.write()?;
        let key = (write.user_id, write.achievement_id);
        if state.progress.contains_key(&key) {
            return Err(AppError::Validation(format!(
                "progress for user {} and achievement {} already exists",
                write.user_id, write.achievement_id
            )));
        }
        let row = user_achievement::Model {
            id: state.next_id(),
            user_id: write.user_id,
            achievement_id: write.achievement_id,
            progress: write.progress,
            is_completed: write.is_completed,
            date_earned: write.date_earned,
            created_at: write.now,
            updated_at: write.now,
        };
        state.progress.insert(key, row.clone());
        Ok(row)
    }

    async fn update_progress(
        &self,
        id: i32,
        write: ProgressWrite,
    ) -> Result<user_achievement::Model, AppError> {
        let mut state = self.write()?;
        let row = state
            .progress
            .get_mut(&(write.user_id, write.achievement_id))
            .filter(|row| row.id == id)
            .ok_or_else(|| AppError::not_found(format!("user achievement {id}")))?;
        row.progress = write.progress;
        row.is_completed = write.is_completed;
        row.date_earned = write.date_earned;
        row.updated_at = write.now;
        Ok(row.clone())
    }

    async fn count_completed(&self, user_id: i32) -> Result<u64, AppError> {
        let count = self
            .read()?
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.is_completed)
            .count();
        Ok(count as u64)
    }
}
