//! Pipeline context management.
//!
//! Provides per-request context for logging and rejection records.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one boundary call (a submission or a status query).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_id(&format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]))
    }

    /// Reuse an id assigned upstream (e.g. by the web layer).
    pub fn with_id(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            received_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.request_id)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_short_and_distinct() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert!(a.request_id.starts_with("req-"));
        assert_eq!(a.request_id.len(), 12);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_log_context_carries_request_id() {
        let ctx = RequestContext::with_id("req-upstream");
        assert_eq!(format!("{}", ctx.log_context()), "[req=req-upstream]");
    }
}
