use async_graphql::SimpleObject;
use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, SimpleObject)]
#[sea_orm(table_name = "activity")]
#[graphql(name = "Activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,

    pub description: String,

    /// kg CO2e, negative for a reduction.
    pub carbon_amount: f64,

    /// Local wall-clock time the activity happened.
    pub date: NaiveDateTime,

    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::activity_category::Entity",
        from = "Column::CategoryId",
        to = "super::activity_category::Column::Id"
    )]
    ActivityCategory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::activity_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
