use std::{fmt, str::FromStr};

use async_graphql::InputObject;
use chrono::NaiveDateTime;

/// Metric an achievement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdType {
    TotalActivities,
    TransportActivities,
    ConsecutiveDays,
    CarbonReduction,
    MonthlyReduction,
}

impl ThresholdType {
    pub const ALL: [ThresholdType; 5] = [
        ThresholdType::TotalActivities,
        ThresholdType::TransportActivities,
        ThresholdType::ConsecutiveDays,
        ThresholdType::CarbonReduction,
        ThresholdType::MonthlyReduction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdType::TotalActivities => "total_activities",
            ThresholdType::TransportActivities => "transport_activities",
            ThresholdType::ConsecutiveDays => "consecutive_days",
            ThresholdType::CarbonReduction => "carbon_reduction",
            ThresholdType::MonthlyReduction => "monthly_reduction",
        }
    }
}

impl fmt::Display for ThresholdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown threshold type '{0}'")]
pub struct UnknownThresholdType(pub String);

impl FromStr for ThresholdType {
    type Err = UnknownThresholdType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThresholdType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownThresholdType(s.to_string()))
    }
}

/// Name of the category counted by `transport_activities`.
pub const TRANSPORT_CATEGORY: &str = "transport";

#[derive(Debug, Clone, InputObject)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
}

/// Activity as submitted by a user. Either `carbon_amount` is given
/// directly (negative for a reduction) or it is estimated from
/// `activity_type` and `quantity`.
#[derive(Debug, Clone, Default, InputObject)]
pub struct NewActivity {
    pub category_id: i32,
    pub description: String,
    pub activity_type: Option<String>,
    pub quantity: Option<f64>,
    pub carbon_amount: Option<f64>,
    pub date: Option<NaiveDateTime>,
}

/// Activity row ready to be stored.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub user_id: i32,
    pub category_id: i32,
    pub description: String,
    pub carbon_amount: f64,
    pub date: NaiveDateTime,
}

/// Achievement catalog entry to be stored.
#[derive(Debug, Clone)]
pub struct AchievementRecord {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub threshold_type: String,
    pub threshold_value: f64,
}

/// New state of a (user, achievement) progress row.
#[derive(Debug, Clone)]
pub struct ProgressWrite {
    pub user_id: i32,
    pub achievement_id: i32,
    pub progress: f64,
    pub is_completed: bool,
    pub date_earned: Option<NaiveDateTime>,
    pub now: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_types_parse_from_their_names() {
        for t in ThresholdType::ALL {
            assert_eq!(t.as_str().parse::<ThresholdType>(), Ok(t));
        }
    }

    #[test]
    fn unknown_threshold_type_is_rejected() {
        let err = "weekly_streak".parse::<ThresholdType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown threshold type 'weekly_streak'");
    }
}
