//! Storage module.
//!
//! Report models, the repository abstraction the engine is built on, and
//! SQL builders for the durable `reports` table.

pub mod models;
pub mod queries;
pub mod repository;

pub use models::*;
pub use queries::*;
pub use repository::*;
