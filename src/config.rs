use std::{fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,
    pub score_baseline: f64,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        if dotenvy::dotenv().is_err() {
            info!(".env file not found, using process environment");
        }

        let database_url = dotenvy::var("DATABASE_URL")
            .map_err(|_| AppError::Validation("DATABASE_URL must be set".to_string()))?;

        Ok(Self {
            database_url,
            bind_address: try_load("BIND_ADDRESS", "127.0.0.1:8000")?,
            cors_allowed_origins: dotenvy::var("CORS_ALLOWED_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or_else(|_| {
                    vec![
                        "http://127.0.0.1:3000".to_string(),
                        "http://localhost:3000".to_string(),
                    ]
                }),
            score_baseline: try_load("ECOTRACK_SCORE_BASELINE", "1000")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = dotenvy::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Validation(format!("invalid {key}: {e}"))
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
