use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Schema};
use entity::{achievement, activity, activity_category, user};

use crate::achievements::EvaluationSummary;
use crate::carbon::{self, EmissionFactor};
use crate::domain::{NewActivity, NewUser};
use crate::service::{AchievementProgress, LoggedActivity, UserAggregateService};

pub type EcoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub struct Context {
    service: Arc<UserAggregateService>,
}

impl Context {
    pub fn new(service: Arc<UserAggregateService>) -> Self {
        Self { service }
    }
}

pub fn build_schema(service: Arc<UserAggregateService>) -> EcoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(Context::new(service))
        .finish()
}

fn service<'a>(
    ctx: &async_graphql::Context<'a>,
) -> Result<&'a UserAggregateService, async_graphql::Error> {
    Ok(ctx.data::<Context>()?.service.as_ref())
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn achievements(
        &self,
        ctx: &async_graphql::Context<'_>,
    ) -> Result<Vec<achievement::Model>, async_graphql::Error> {
        Ok(service(ctx)?.store().list_achievements().await?)
    }

    async fn categories(
        &self,
        ctx: &async_graphql::Context<'_>,
    ) -> Result<Vec<activity_category::Model>, async_graphql::Error> {
        Ok(service(ctx)?.store().list_categories().await?)
    }

    async fn emission_factors(&self, category: String) -> Vec<EmissionFactor> {
        carbon::factors(&category)
    }

    async fn user(
        &self,
        ctx: &async_graphql::Context<'_>,
        id: i32,
    ) -> Result<user::Model, async_graphql::Error> {
        match service(ctx)?.store().find_user(id).await? {
            Some(user) => Ok(user),
            None => Err(async_graphql::Error::new("user not found")),
        }
    }

    async fn activities(
        &self,
        ctx: &async_graphql::Context<'_>,
        user_id: i32,
    ) -> Result<Vec<activity::Model>, async_graphql::Error> {
        Ok(service(ctx)?.store().list_activities(user_id).await?)
    }

    async fn user_achievements(
        &self,
        ctx: &async_graphql::Context<'_>,
        user_id: i32,
    ) -> Result<Vec<AchievementProgress>, async_graphql::Error> {
        Ok(service(ctx)?.user_achievements(user_id).await?)
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_user(
        &self,
        ctx: &async_graphql::Context<'_>,
        input: NewUser,
    ) -> Result<user::Model, async_graphql::Error> {
        Ok(service(ctx)?.create_user(input).await?)
    }

    async fn log_activity(
        &self,
        ctx: &async_graphql::Context<'_>,
        user_id: i32,
        input: NewActivity,
    ) -> Result<LoggedActivity, async_graphql::Error> {
        Ok(service(ctx)?.log_activity(user_id, input).await?)
    }

    async fn process_achievements(
        &self,
        ctx: &async_graphql::Context<'_>,
        user_id: i32,
    ) -> Result<EvaluationSummary, async_graphql::Error> {
        Ok(service(ctx)?.process_achievements(user_id).await?)
    }
}
