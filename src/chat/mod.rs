//! LINE chat integration.
//!
//! Answers "current status" questions sent to the LINE account:
//! - webhook signature verification
//! - text message extraction
//! - status replies

pub mod reply;
pub mod signature;
pub mod webhook;

pub use reply::*;
pub use signature::*;
pub use webhook::*;
