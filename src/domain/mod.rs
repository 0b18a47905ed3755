//! Domain layer: threshold types, command inputs and the repository traits
//! the engine is written against.

pub mod model;
pub mod repositories;

pub use model::*;
pub use repositories::*;
