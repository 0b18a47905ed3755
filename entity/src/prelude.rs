pub use super::achievement::Entity as Achievement;
pub use super::activity::Entity as Activity;
pub use super::activity_category::Entity as ActivityCategory;
pub use super::user::Entity as User;
pub use super::user_achievement::Entity as UserAchievement;
