//! Storage backends for the `Store` trait.

pub mod memory;
pub mod sea;

pub use memory::InMemoryStore;
pub use sea::SeaOrmStore;
