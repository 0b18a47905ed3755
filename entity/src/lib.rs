pub mod prelude;

pub mod achievement;
pub mod activity;
pub mod activity_category;
pub mod user;
pub mod user_achievement;
