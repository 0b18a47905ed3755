//! The engine against the relational store on an in-memory SQLite database.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use ecotrack::domain::{
    AchievementRepository, ActivityRepository, NewActivity, NewUser, ProgressWrite,
    UserRepository,
};
use ecotrack::service::UserAggregateService;
use ecotrack::store::SeaOrmStore;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    db
}

async fn setup() -> (Arc<SeaOrmStore>, UserAggregateService, i32) {
    let store = Arc::new(SeaOrmStore::new(setup_test_db().await));
    let service = UserAggregateService::new(store.clone(), 1000.0);
    let user = service
        .create_user(NewUser {
            username: "greta".to_string(),
            email: "greta@example.com".to_string(),
            name: "Greta".to_string(),
        })
        .await
        .expect("Failed to create user");
    (store, service, user.id)
}

async fn category_id(store: &SeaOrmStore, name: &str) -> i32 {
    store
        .find_category_by_name(name)
        .await
        .unwrap()
        .expect("seeded category")
        .id
}

#[tokio::test]
async fn migrations_seed_categories_and_catalog() {
    let store = SeaOrmStore::new(setup_test_db().await);

    let names: Vec<String> = store
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["transport", "housing", "food", "goods"]);

    let catalog = store.list_achievements().await.unwrap();
    assert_eq!(catalog.len(), 8);
    assert!(catalog
        .iter()
        .all(|a| a.threshold_type.parse::<ecotrack::domain::ThresholdType>().is_ok()));
}

#[tokio::test]
async fn logging_activities_tracks_progress_in_the_database() {
    let (store, service, user_id) = setup().await;
    let transport = category_id(&store, "transport").await;
    let food = category_id(&store, "food").await;

    for (day, category, amount) in [(8, food, 3.0), (9, transport, -4.0), (10, transport, -8.0)] {
        service
            .log_activity_at(
                user_id,
                NewActivity {
                    category_id: category,
                    description: format!("day {day}"),
                    carbon_amount: Some(amount),
                    date: Some(at(2024, 3, day, 9)),
                    ..Default::default()
                },
                at(2024, 3, 10, 18),
            )
            .await
            .unwrap();
    }

    let view = service.user_achievements(user_id).await.unwrap();
    let by_name = |name: &str| {
        view.iter()
            .find(|p| p.achievement.name == name)
            .unwrap_or_else(|| panic!("{name} missing"))
    };
    assert!(by_name("First Step").is_completed);
    assert_eq!(by_name("Eco Enthusiast").progress, 3.0);
    assert_eq!(by_name("Green Commuter").progress, 2.0);
    assert!(by_name("Streak Starter").is_completed);
    assert_eq!(by_name("Week Warrior").progress, 3.0);
    assert!(by_name("Carbon Cutter").is_completed);
    assert_eq!(by_name("Carbon Cutter").progress, 12.0);
    assert_eq!(by_name("Monthly Improver").progress, 0.0);
    assert_eq!(by_name("Week Warrior").date_earned, None);
    assert_eq!(by_name("Carbon Cutter").date_earned, Some(at(2024, 3, 10, 18)));

    let user = store.find_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.carbon_footprint, -9.0);
    // 1009 for the footprint, three completions
    assert_eq!(user.score, 1009 + 150);
}

#[tokio::test]
async fn reprocessing_keeps_one_row_per_achievement() {
    let (store, service, user_id) = setup().await;
    let food = category_id(&store, "food").await;
    let now = at(2024, 3, 10, 12);
    service
        .log_activity_at(
            user_id,
            NewActivity {
                category_id: food,
                description: "Lentil soup".to_string(),
                activity_type: Some("plant_based_meal".to_string()),
                quantity: Some(1.0),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    let score = store.find_user(user_id).await.unwrap().unwrap().score;

    for _ in 0..3 {
        let summary = service
            .processor()
            .process_for_user_at(user_id, now)
            .await
            .unwrap();
        assert_eq!(summary.points_awarded, 0);
    }

    let rows = store.list_progress(user_id).await.unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(store.count_completed(user_id).await.unwrap(), 1);
    assert_eq!(store.find_user(user_id).await.unwrap().unwrap().score, score);
}

#[tokio::test]
async fn unique_index_rejects_a_second_progress_row() {
    let (store, service, user_id) = setup().await;
    let achievement_id = store.list_achievements().await.unwrap()[0].id;
    service
        .processor()
        .process_for_user_at(user_id, at(2024, 3, 10, 12))
        .await
        .unwrap();

    let duplicate = store
        .insert_progress(ProgressWrite {
            user_id,
            achievement_id,
            progress: 0.0,
            is_completed: false,
            date_earned: None,
            now: at(2024, 3, 10, 12),
        })
        .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn monthly_reduction_reads_calendar_month_windows() {
    let (store, service, user_id) = setup().await;
    let housing = category_id(&store, "housing").await;

    for (date, amount) in [
        (at(2024, 2, 1, 0), 60.0),
        (at(2024, 2, 29, 23), 40.0),
        (at(2024, 3, 5, 8), 70.0),
    ] {
        store
            .insert_activity(
                ecotrack::domain::ActivityRecord {
                    user_id,
                    category_id: housing,
                    description: "Heating".to_string(),
                    carbon_amount: amount,
                    date,
                },
                date,
            )
            .await
            .unwrap();
    }

    service
        .processor()
        .process_for_user_at(user_id, at(2024, 3, 20, 12))
        .await
        .unwrap();
    let view = service.user_achievements(user_id).await.unwrap();
    let monthly = view
        .iter()
        .find(|p| p.achievement.threshold_type == "monthly_reduction")
        .unwrap();
    assert!((monthly.progress - 30.0).abs() < 1e-9);
    assert!(monthly.is_completed);
}

#[tokio::test]
async fn add_score_increments_in_place() {
    let (store, _service, user_id) = setup().await;

    let (a, b) = tokio::join!(store.add_score(user_id, 50), store.add_score(user_id, 50));
    a.unwrap();
    b.unwrap();
    let user = store.find_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.score, 1100);

    let missing = store.add_score(user_id + 1, 50).await;
    assert!(matches!(missing, Err(ecotrack::AppError::NotFound(_))));
}
