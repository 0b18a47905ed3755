//! Log-activity command and GraphQL surface over the in-memory store.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use ecotrack::domain::{
    AchievementRecord, AchievementRepository, ActivityRepository, NewActivity, NewUser,
    UserRepository,
};
use ecotrack::graphql::build_schema;
use ecotrack::service::{footprint_score, UserAggregateService, DEFAULT_SCORE_BASELINE};
use ecotrack::store::InMemoryStore;
use ecotrack::AppError;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

async fn setup() -> (Arc<UserAggregateService>, i32, i32, i32) {
    let store = Arc::new(InMemoryStore::new());
    let transport_id = store.insert_category("transport", "", "car").unwrap().id;
    let food_id = store.insert_category("food", "", "utensils").unwrap().id;
    for (threshold_type, value) in [
        ("total_activities", 1.0),
        ("transport_activities", 5.0),
        ("carbon_reduction", 10.0),
    ] {
        store
            .create_achievement(
                AchievementRecord {
                    name: threshold_type.to_string(),
                    description: String::new(),
                    icon: "star".to_string(),
                    threshold_type: threshold_type.to_string(),
                    threshold_value: value,
                },
                at(2024, 1, 1, 0),
            )
            .await
            .unwrap();
    }

    let service = Arc::new(UserAggregateService::new(store, DEFAULT_SCORE_BASELINE));
    let user = service
        .create_user(NewUser {
            username: "greta".to_string(),
            email: "greta@example.com".to_string(),
            name: "Greta".to_string(),
        })
        .await
        .unwrap();
    (service, user.id, transport_id, food_id)
}

#[tokio::test]
async fn new_user_starts_at_baseline_score() {
    let (service, user_id, _, _) = setup().await;
    let user = service.store().find_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.score, 1000);
    assert_eq!(user.carbon_footprint, 0.0);
}

#[tokio::test]
async fn logging_updates_footprint_score_and_achievements_in_order() {
    let (service, user_id, transport_id, _) = setup().await;
    let now = at(2024, 3, 10, 12);

    let logged = service
        .log_activity_at(
            user_id,
            NewActivity {
                category_id: transport_id,
                description: "Cycled instead of driving".to_string(),
                carbon_amount: Some(-12.0),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();

    assert_eq!(logged.activity.carbon_amount, -12.0);
    assert_eq!(logged.activity.date, now);
    assert_eq!(logged.user.carbon_footprint, -12.0);
    let summary = logged.achievements.unwrap();
    assert_eq!(summary.newly_completed, 2);
    // baseline score for the footprint plus two completions
    assert_eq!(logged.user.score, 1012 + 100);

    let logged = service
        .log_activity_at(
            user_id,
            NewActivity {
                category_id: transport_id,
                description: "Drove to work".to_string(),
                activity_type: Some("car".to_string()),
                quantity: Some(100.0),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();

    assert!((logged.activity.carbon_amount - 19.2).abs() < 1e-9);
    let footprint = logged.user.carbon_footprint;
    assert!((footprint - 7.2).abs() < 1e-9);
    assert_eq!(logged.achievements.unwrap().newly_completed, 0);
    // earlier completions survive the recompute
    assert_eq!(
        logged.user.score,
        footprint_score(footprint, DEFAULT_SCORE_BASELINE) + 100
    );

    let view = service.user_achievements(user_id).await.unwrap();
    assert_eq!(view.len(), 3);
    let transport = view
        .iter()
        .find(|p| p.achievement.threshold_type == "transport_activities")
        .unwrap();
    assert_eq!(transport.progress, 2.0);
    assert!(!transport.is_completed);
    assert_eq!(transport.date_earned, None);
}

#[tokio::test]
async fn log_activity_rejects_bad_input() {
    let (service, user_id, transport_id, food_id) = setup().await;
    let now = at(2024, 3, 10, 12);

    let missing_user = service
        .log_activity_at(
            999,
            NewActivity {
                category_id: transport_id,
                carbon_amount: Some(1.0),
                ..Default::default()
            },
            now,
        )
        .await;
    assert!(matches!(missing_user, Err(AppError::NotFound(_))));

    let missing_category = service
        .log_activity_at(
            user_id,
            NewActivity {
                category_id: 999,
                carbon_amount: Some(1.0),
                ..Default::default()
            },
            now,
        )
        .await;
    assert!(matches!(missing_category, Err(AppError::NotFound(_))));

    let no_amount = service
        .log_activity_at(
            user_id,
            NewActivity {
                category_id: food_id,
                ..Default::default()
            },
            now,
        )
        .await;
    assert!(matches!(no_amount, Err(AppError::Validation(_))));

    let wrong_type = service
        .log_activity_at(
            user_id,
            NewActivity {
                category_id: food_id,
                activity_type: Some("car".to_string()),
                quantity: Some(10.0),
                ..Default::default()
            },
            now,
        )
        .await;
    assert!(matches!(wrong_type, Err(AppError::Validation(_))));

    assert!(service.store().list_activities(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_user_validates_input() {
    let (service, _, _, _) = setup().await;
    let duplicate = service
        .create_user(NewUser {
            username: "greta".to_string(),
            email: "other@example.com".to_string(),
            name: "Other".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));

    let bad_email = service
        .create_user(NewUser {
            username: "sam".to_string(),
            email: "not-an-email".to_string(),
            name: "Sam".to_string(),
        })
        .await;
    assert!(matches!(bad_email, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn graphql_logs_activity_and_lists_progress() {
    let (service, user_id, _, food_id) = setup().await;
    let schema = build_schema(service);

    let mutation = format!(
        r#"mutation {{
            logActivity(userId: {user_id}, input: {{ categoryId: {food_id}, description: "Salad", activityType: "vegetables", quantity: 0.5 }}) {{
                activity {{ carbonAmount }}
                achievements {{ newlyCompleted pointsAwarded }}
            }}
        }}"#
    );
    let response = schema.execute(mutation.as_str()).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["logActivity"]["activity"]["carbonAmount"], 1.0);
    assert_eq!(data["logActivity"]["achievements"]["pointsAwarded"], 50);

    let query = format!(
        "{{ userAchievements(userId: {user_id}) {{ isCompleted achievement {{ thresholdType }} }} }}"
    );
    let response = schema.execute(query.as_str()).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    let rows = data["userAchievements"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["achievement"]["thresholdType"], "total_activities");
    assert_eq!(rows[0]["isCompleted"], true);
}

#[tokio::test]
async fn graphql_reports_unknown_user() {
    let (service, _, _, _) = setup().await;
    let schema = build_schema(service);

    let response = schema.execute("{ user(id: 999) { id } }").await;
    assert_eq!(response.errors.len(), 1);

    let response = schema
        .execute("mutation { processAchievements(userId: 999) { evaluated } }")
        .await;
    assert_eq!(response.errors[0].message, "user 999 not found");
}

#[tokio::test]
async fn graphql_lists_emission_factors() {
    let (service, _, _, _) = setup().await;
    let schema = build_schema(service);

    let response = schema
        .execute(r#"{ emissionFactors(category: "transport") { activityType factor unit } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    let factors = data["emissionFactors"].as_array().unwrap();
    assert_eq!(factors[0]["activityType"], "car");
    assert_eq!(factors[0]["unit"], "km");
}
