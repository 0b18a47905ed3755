use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(User::Username)
                            .string()
                            .unique_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(User::Email).string().unique_key().not_null())
                    .col(ColumnDef::new(User::Name).string().not_null())
                    .col(
                        ColumnDef::new(User::CarbonFootprint)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(User::Score).integer().not_null().default(0))
                    .col(ColumnDef::new(User::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(User::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(ActivityCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityCategory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityCategory::Name)
                            .string()
                            .unique_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityCategory::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityCategory::Icon).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::UserId).integer().not_null())
                    .col(ColumnDef::new(Activity::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Activity::Description).string().not_null())
                    .col(ColumnDef::new(Activity::CarbonAmount).double().not_null())
                    .col(ColumnDef::new(Activity::Date).date_time().not_null())
                    .col(ColumnDef::new(Activity::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-activity-user_id")
                            .from(Activity::Table, Activity::UserId)
                            .to(User::Table, User::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-activity-category_id")
                            .from(Activity::Table, Activity::CategoryId)
                            .to(ActivityCategory::Table, ActivityCategory::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-activity-user_id-date")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .col(Activity::Date)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Achievement::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Achievement::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Achievement::Name).string().not_null())
                    .col(ColumnDef::new(Achievement::Description).string().not_null())
                    .col(ColumnDef::new(Achievement::Icon).string().not_null())
                    .col(ColumnDef::new(Achievement::ThresholdType).string().not_null())
                    .col(
                        ColumnDef::new(Achievement::ThresholdValue)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Achievement::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Achievement::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(UserAchievement::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserAchievement::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserAchievement::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(UserAchievement::AchievementId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserAchievement::Progress)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(UserAchievement::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(UserAchievement::DateEarned).date_time())
                    .col(
                        ColumnDef::new(UserAchievement::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserAchievement::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_achievement-user_id")
                            .from(UserAchievement::Table, UserAchievement::UserId)
                            .to(User::Table, User::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_achievement-achievement_id")
                            .from(UserAchievement::Table, UserAchievement::AchievementId)
                            .to(Achievement::Table, Achievement::Id),
                    )
                    .to_owned(),
            )
            .await?;
        // one progress row per (user, achievement)
        manager
            .create_index(
                Index::create()
                    .name("idx-user_achievement-user_id-achievement_id")
                    .table(UserAchievement::Table)
                    .col(UserAchievement::UserId)
                    .col(UserAchievement::AchievementId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAchievement::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Achievement::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityCategory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Username,
    Email,
    Name,
    CarbonFootprint,
    Score,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ActivityCategory {
    Table,
    Id,
    Name,
    Description,
    Icon,
}

#[derive(DeriveIden)]
enum Activity {
    Table,
    Id,
    UserId,
    CategoryId,
    Description,
    CarbonAmount,
    Date,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Achievement {
    Table,
    Id,
    Name,
    Description,
    Icon,
    ThresholdType,
    ThresholdValue,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserAchievement {
    Table,
    Id,
    UserId,
    AchievementId,
    Progress,
    IsCompleted,
    DateEarned,
    CreatedAt,
    UpdatedAt,
}
