//! Structured logging with request context.
//!
//! Every log line carries the request id (and the report id once one is
//! assigned) so a submission can be followed from boundary to storage.

pub mod structured;

pub use structured::*;

/// Initialize the process-wide logger. Safe to call repeatedly.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
