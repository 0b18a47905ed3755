pub mod achievements;
pub mod carbon;
pub mod config;
pub mod domain;
pub mod error;
pub mod graphql;
pub mod service;
pub mod store;

pub use error::AppError;
