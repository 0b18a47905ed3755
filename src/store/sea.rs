//! sea-orm implementation of `Store`.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use entity::{
    achievement, activity, activity_category,
    prelude::{Achievement, Activity, ActivityCategory, User, UserAchievement},
    user, user_achievement,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::{
    AchievementRecord, AchievementRepository, ActivityRecord, ActivityRepository, NewUser,
    ProgressWrite, UserRepository,
};
use crate::AppError;

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmStore {
    async fn find_user(&self, id: i32) -> Result<Option<user::Model>, AppError> {
        Ok(User::find_by_id(id).one(&self.db).await?)
    }

    async fn create_user(
        &self,
        input: NewUser,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError> {
        let taken = User::find()
            .filter(
                user::Column::Username
                    .eq(input.username.as_str())
                    .or(user::Column::Email.eq(input.email.as_str())),
            )
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(AppError::Validation(
                "username or email already taken".to_string(),
            ));
        }

        let user = user::ActiveModel {
            username: Set(input.username),
            email: Set(input.email),
            name: Set(input.name),
            carbon_footprint: Set(0.0),
            score: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(user.insert(&self.db).await?)
    }

    async fn update_aggregate(
        &self,
        user_id: i32,
        carbon_footprint: f64,
        score: i32,
        now: NaiveDateTime,
    ) -> Result<user::Model, AppError> {
        let user: user::Model = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;

        let mut user: user::ActiveModel = user.into();
        user.carbon_footprint = Set(carbon_footprint);
        user.score = Set(score);
        user.updated_at = Set(now);

        Ok(user.update(&self.db).await?)
    }

    async fn add_score(&self, user_id: i32, delta: i32) -> Result<i32, AppError> {
        // single UPDATE so concurrent awards cannot overwrite each other
        let result = User::update_many()
            .col_expr(
                user::Column::Score,
                Expr::col(user::Column::Score).add(delta),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found(format!("user {user_id}")));
        }

        let score: Option<i32> = User::find_by_id(user_id)
            .select_only()
            .column(user::Column::Score)
            .into_tuple()
            .one(&self.db)
            .await?;
        score.ok_or_else(|| AppError::not_found(format!("user {user_id}")))
    }
}

#[async_trait]
impl ActivityRepository for SeaOrmStore {
    async fn list_categories(&self) -> Result<Vec<activity_category::Model>, AppError> {
        Ok(ActivityCategory::find()
            .order_by_asc(activity_category::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn find_category(&self, id: i32) -> Result<Option<activity_category::Model>, AppError> {
        Ok(ActivityCategory::find_by_id(id).one(&self.db).await?)
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<activity_category::Model>, AppError> {
        Ok(ActivityCategory::find_by_name(name).one(&self.db).await?)
    }

    async fn insert_activity(
        &self,
        record: ActivityRecord,
        now: NaiveDateTime,
    ) -> Result<activity::Model, AppError> {
        let activity = activity::ActiveModel {
            user_id: Set(record.user_id),
            category_id: Set(record.category_id),
            description: Set(record.description),
            carbon_amount: Set(record.carbon_amount),
            date: Set(record.date),
            created_at: Set(now),
            ..Default::default()
        };

        Ok(activity.insert(&self.db).await?)
    }

    async fn list_activities(&self, user_id: i32) -> Result<Vec<activity::Model>, AppError> {
        Ok(Activity::find()
            .filter(activity::Column::UserId.eq(user_id))
            .order_by_desc(activity::Column::Date)
            .all(&self.db)
            .await?)
    }

    async fn count_activities(
        &self,
        user_id: i32,
        category_id: Option<i32>,
    ) -> Result<u64, AppError> {
        let mut query = Activity::find().filter(activity::Column::UserId.eq(user_id));
        if let Some(category_id) = category_id {
            query = query.filter(activity::Column::CategoryId.eq(category_id));
        }
        Ok(query.count(&self.db).await?)
    }

    async fn activity_dates(
        &self,
        user_id: i32,
        until: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>, AppError> {
        Ok(Activity::find()
            .select_only()
            .column(activity::Column::Date)
            .filter(activity::Column::UserId.eq(user_id))
            .filter(activity::Column::Date.lte(until))
            .order_by_desc(activity::Column::Date)
            .into_tuple()
            .all(&self.db)
            .await?)
    }

    async fn carbon_amounts(
        &self,
        user_id: i32,
        range: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<Vec<f64>, AppError> {
        let mut query = Activity::find()
            .select_only()
            .column(activity::Column::CarbonAmount)
            .filter(activity::Column::UserId.eq(user_id));
        if let Some((start, end)) = range {
            query = query
                .filter(activity::Column::Date.gte(start))
                .filter(activity::Column::Date.lt(end));
        }
        Ok(query.into_tuple().all(&self.db).await?)
    }
}

#[async_trait]
impl AchievementRepository for SeaOrmStore {
    async fn list_achievements(&self) -> Result<Vec<achievement::Model>, AppError> {
        Ok(Achievement::find()
            .order_by_asc(achievement::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn create_achievement(
        &self,
        record: AchievementRecord,
        now: NaiveDateTime,
    ) -> Result<achievement::Model, AppError> {
        let achievement = achievement::ActiveModel {
            name: Set(record.name),
            description: Set(record.description),
            icon: Set(record.icon),
            threshold_type: Set(record.threshold_type),
            threshold_value: Set(record.threshold_value),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(achievement.insert(&self.db).await?)
    }

    async fn find_progress(
        &self,
        user_id: i32,
        achievement_id: i32,
    ) -> Result<Option<user_achievement::Model>, AppError> {
        Ok(UserAchievement::find_for_pair(user_id, achievement_id)
            .one(&self.db)
            .await?)
    }

    async fn list_progress(
        &self,
        user_id: i32,
    ) -> Result<Vec<user_achievement::Model>, AppError> {
        Ok(UserAchievement::find()
            .filter(user_achievement::Column::UserId.eq(user_id))
            .order_by_asc(user_achievement::Column::AchievementId)
            .all(&self.db)
            .await?)
    }

    async fn insert_progress(
        &self,
        write: ProgressWrite,
    ) -> Result<user_achievement::Model, AppError> {
        let row = user_achievement::ActiveModel {
            user_id: Set(write.user_id),
            achievement_id: Set(write.achievement_id),
            progress: Set(write.progress),
            is_completed: Set(write.is_completed),
            date_earned: Set(write.date_earned),
            created_at: Set(write.now),
            updated_at: Set(write.now),
            ..Default::default()
        };

        Ok(row.insert(&self.db).await?)
    }

    async fn update_progress(
        &self,
        id: i32,
        write: ProgressWrite,
    ) -> Result<user_achievement::Model, AppError> {
        let row = user_achievement::ActiveModel {
            id: Set(id),
            progress: Set(write.progress),
            is_completed: Set(write.is_completed),
            date_earned: Set(write.date_earned),
            updated_at: Set(write.now),
            ..Default::default()
        };

        Ok(row.update(&self.db).await?)
    }

    async fn count_completed(&self, user_id: i32) -> Result<u64, AppError> {
        Ok(UserAchievement::find()
            .filter(user_achievement::Column::UserId.eq(user_id))
            .filter(user_achievement::Column::IsCompleted.eq(true))
            .count(&self.db)
            .await?)
    }
}
