//! Progress metric providers, one per threshold type.
//!
//! All of them are plain reads against the store and are recomputed on every
//! evaluation.

use std::collections::HashSet;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{Store, ThresholdType, TRANSPORT_CATEGORY};
use crate::AppError;

/// Current progress of `user_id` for `threshold_type`, as of `now` (local time).
pub async fn compute_progress(
    store: &dyn Store,
    threshold_type: ThresholdType,
    user_id: i32,
    now: NaiveDateTime,
) -> Result<f64, AppError> {
    match threshold_type {
        ThresholdType::TotalActivities => total_activities(store, user_id).await,
        ThresholdType::TransportActivities => transport_activities(store, user_id).await,
        ThresholdType::ConsecutiveDays => consecutive_days(store, user_id, now.date()).await,
        ThresholdType::CarbonReduction => carbon_reduction(store, user_id).await,
        ThresholdType::MonthlyReduction => monthly_reduction(store, user_id, now.date()).await,
    }
}

pub async fn total_activities(store: &dyn Store, user_id: i32) -> Result<f64, AppError> {
    Ok(store.count_activities(user_id, None).await? as f64)
}

pub async fn category_activities(
    store: &dyn Store,
    user_id: i32,
    category_id: i32,
) -> Result<f64, AppError> {
    Ok(store.count_activities(user_id, Some(category_id)).await? as f64)
}

/// Counted against the `transport` category; 0 while that category is missing.
pub async fn transport_activities(store: &dyn Store, user_id: i32) -> Result<f64, AppError> {
    match store.find_category_by_name(TRANSPORT_CATEGORY).await? {
        Some(category) => category_activities(store, user_id, category.id).await,
        None => {
            tracing::warn!("No '{TRANSPORT_CATEGORY}' category, transport progress stays at 0");
            Ok(0.0)
        }
    }
}

pub async fn consecutive_days(
    store: &dyn Store,
    user_id: i32,
    today: NaiveDate,
) -> Result<f64, AppError> {
    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| AppError::Internal(format!("no day after {today}")))?;
    let dates = store
        .activity_dates(user_id, tomorrow.and_time(NaiveTime::MIN))
        .await?;
    Ok(streak_ending_on(dates.iter().map(|d| d.date()), today) as f64)
}

pub async fn carbon_reduction(store: &dyn Store, user_id: i32) -> Result<f64, AppError> {
    let amounts = store.carbon_amounts(user_id, None).await?;
    Ok(total_reduction(&amounts))
}

pub async fn monthly_reduction(
    store: &dyn Store,
    user_id: i32,
    today: NaiveDate,
) -> Result<f64, AppError> {
    let (previous, current) = month_windows(today)?;
    let previous_total: f64 = store
        .carbon_amounts(user_id, Some(previous))
        .await?
        .iter()
        .sum();
    let current_total: f64 = store
        .carbon_amounts(user_id, Some(current))
        .await?
        .iter()
        .sum();
    Ok(reduction_percent(previous_total, current_total))
}

/// Number of consecutive days ending on `today` that appear in `days`.
pub fn streak_ending_on(days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = days.into_iter().collect();
    let mut streak = 0;
    let mut day = Some(today);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

/// Sum of the absolute values of the negative amounts.
pub fn total_reduction(amounts: &[f64]) -> f64 {
    amounts.iter().filter(|a| **a < 0.0).map(|a| a.abs()).sum()
}

/// Percentage drop from `previous` to `current`, floored at 0.
pub fn reduction_percent(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    let percent = (previous - current) / previous * 100.0;
    if percent.is_finite() {
        percent.max(0.0)
    } else {
        0.0
    }
}

type Window = (NaiveDateTime, NaiveDateTime);

/// `[start, end)` windows of the previous and the current calendar month.
pub fn month_windows(today: NaiveDate) -> Result<(Window, Window), AppError> {
    let out_of_range = || AppError::Internal(format!("month boundaries out of range for {today}"));

    let current_start = today.with_day(1).ok_or_else(out_of_range)?;
    let previous_start = current_start
        .checked_sub_months(Months::new(1))
        .ok_or_else(out_of_range)?;
    let next_start = current_start
        .checked_add_months(Months::new(1))
        .ok_or_else(out_of_range)?;

    let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
    Ok((
        (midnight(previous_start), midnight(current_start)),
        (midnight(current_start), midnight(next_start)),
    ))
}
