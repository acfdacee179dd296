//! Consensus module.
//!
//! Decides what the public page shows:
//! - Monitoring (not enough reports yet)
//! - Dry (too few flooded reports)
//! - Flooding, with an agreed depth or impact category when reports agree

pub mod decision;
pub mod tally;
pub mod view;

pub use decision::*;
pub use tally::*;
pub use view::*;
