//! Submission validation module.
//!
//! Boundary payloads are checked here before they reach the engine:
//! - flooded flag presence and spelling
//! - depth range and variant agreement
//! - impact category names

pub mod submission;

pub use submission::*;
