//! Core type definitions, random source and error handling

pub mod error;
pub mod rng;
pub mod types;

pub use error::{GenError, Result};
pub use rng::Rng;
pub use types::{ObjectId, ObjectType, Position, RandomValue, VPosition};
