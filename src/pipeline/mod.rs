//! Pipeline orchestration module.
//!
//! The consensus engine and the per-request context it logs with:
//! - Submission validation and storage
//! - Status computation
//! - Page view rendering data

pub mod context;
pub mod engine;

pub use context::*;
pub use engine::*;
