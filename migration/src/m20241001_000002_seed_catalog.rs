use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATEGORIES: [(&str, &str, &str); 4] = [
    ("transport", "Getting around: car, bus, train, flights", "car"),
    ("housing", "Electricity, heating and water at home", "home"),
    ("food", "Meals and groceries", "utensils"),
    ("goods", "Clothing, electronics and other purchases", "shopping-bag"),
];

// (name, description, icon, threshold type, threshold value)
const ACHIEVEMENTS: [(&str, &str, &str, &str, f64); 8] = [
    ("First Step", "Log your first activity", "footprints", "total_activities", 1.0),
    ("Eco Enthusiast", "Log 10 activities", "leaf", "total_activities", 10.0),
    ("Green Commuter", "Log 5 transport activities", "bike", "transport_activities", 5.0),
    ("Streak Starter", "Log activities 3 days in a row", "flame", "consecutive_days", 3.0),
    ("Week Warrior", "Log activities 7 days in a row", "calendar", "consecutive_days", 7.0),
    ("Carbon Cutter", "Avoid 10 kg of CO2e", "scissors", "carbon_reduction", 10.0),
    ("Carbon Crusher", "Avoid 100 kg of CO2e", "hammer", "carbon_reduction", 100.0),
    ("Monthly Improver", "Cut your emissions by 10% compared to last month", "trending-down", "monthly_reduction", 10.0),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut categories = Query::insert();
        categories.into_table(ActivityCategory::Table).columns([
            ActivityCategory::Name,
            ActivityCategory::Description,
            ActivityCategory::Icon,
        ]);
        for (name, description, icon) in CATEGORIES {
            categories.values_panic([name.into(), description.into(), icon.into()]);
        }
        manager.exec_stmt(categories).await?;

        let mut achievements = Query::insert();
        achievements.into_table(Achievement::Table).columns([
            Achievement::Name,
            Achievement::Description,
            Achievement::Icon,
            Achievement::ThresholdType,
            Achievement::ThresholdValue,
            Achievement::CreatedAt,
            Achievement::UpdatedAt,
        ]);
        for (name, description, icon, threshold_type, threshold_value) in ACHIEVEMENTS {
            achievements.values_panic([
                name.into(),
                description.into(),
                icon.into(),
                threshold_type.into(),
                threshold_value.into(),
                Expr::current_timestamp().into(),
                Expr::current_timestamp().into(),
            ]);
        }
        manager.exec_stmt(achievements).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names: Vec<&str> = ACHIEVEMENTS.iter().map(|a| a.0).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Achievement::Table)
                    .and_where(Expr::col(Achievement::Name).is_in(names))
                    .to_owned(),
            )
            .await?;

        let names: Vec<&str> = CATEGORIES.iter().map(|c| c.0).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(ActivityCategory::Table)
                    .and_where(Expr::col(ActivityCategory::Name).is_in(names))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ActivityCategory {
    Table,
    Name,
    Description,
    Icon,
}

#[derive(DeriveIden)]
enum Achievement {
    Table,
    Name,
    Description,
    Icon,
    ThresholdType,
    ThresholdValue,
    CreatedAt,
    UpdatedAt,
}
