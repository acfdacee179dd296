//! Consensus engine.
//!
//! Coordinates the two public operations:
//! 1. submit: validate, then append to the repository
//! 2. current_status: load every report, then decide
//!
//! The engine holds no report state of its own; the injected repository is
//! the single owner of the collection.

use std::sync::Arc;

use crate::config::ConsensusConfig;
use crate::consensus::decision::{decide, StatusSnapshot};
use crate::consensus::view::StatusView;
use crate::error::{FloodWatchError, InvalidReportError, Result};
use crate::storage::models::{Report, ReportRow, StoredReport};
use crate::storage::repository::{InMemoryReportRepository, ReportRepository};
use crate::validation::submission::{
    rejected_submission, validate_report, validate_rows, ReportSubmission,
};
use crate::{log_error, log_info, log_warn};

use super::context::RequestContext;

pub struct ConsensusEngine<R: ReportRepository> {
    repository: Arc<R>,
    config: ConsensusConfig,
}

impl<R: ReportRepository> Clone for ConsensusEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: self.config.clone(),
        }
    }
}

impl ConsensusEngine<InMemoryReportRepository> {
    /// Engine over rows persisted elsewhere. Every row is re-validated
    /// against the configured variant first.
    pub fn from_rows(
        ctx: &RequestContext,
        rows: Vec<ReportRow>,
        config: ConsensusConfig,
    ) -> Result<Self> {
        let stored = validate_rows(rows, config.variant, &ctx.log_context())?;
        Ok(Self::new(
            Arc::new(InMemoryReportRepository::with_reports(stored)),
            config,
        ))
    }
}

impl<R: ReportRepository> ConsensusEngine<R> {
    pub fn new(repository: Arc<R>, config: ConsensusConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Record a typed report.
    pub fn submit(&self, report: Report) -> Result<StoredReport> {
        self.submit_with_context(&RequestContext::new(), report)
    }

    pub fn submit_with_context(&self, ctx: &RequestContext, report: Report) -> Result<StoredReport> {
        let log_ctx = ctx.log_context();

        if let Err(e) = validate_report(&report, self.config.variant) {
            let raw = serde_json::to_string(&report).unwrap_or_default();
            return Err(self.reject(ctx, &raw, e));
        }

        let stored = self.repository.append(report).map_err(|e| {
            log_error!(log_ctx, "STORAGE_WRITE_FAILED", reason = e.reason);
            FloodWatchError::from(e)
        })?;

        log_info!(
            log_ctx.with_report(stored.id),
            "REPORT_ACCEPTED",
            flooded = stored.report.is_flooded,
            reading = stored.report.reading.kind(),
        );
        Ok(stored)
    }

    /// Validate a boundary payload, then record it.
    pub fn submit_payload(
        &self,
        ctx: &RequestContext,
        submission: &ReportSubmission,
    ) -> Result<StoredReport> {
        match submission.validate(self.config.variant) {
            Ok(report) => self.submit_with_context(ctx, report),
            Err(e) => {
                let raw = serde_json::to_string(submission).unwrap_or_default();
                Err(self.reject(ctx, &raw, e))
            }
        }
    }

    /// Parse and record a JSON payload.
    pub fn submit_json(&self, ctx: &RequestContext, payload: &str) -> Result<StoredReport> {
        let submission = ReportSubmission::from_json(payload).map_err(|e| self.reject(ctx, payload, e))?;
        match submission.validate(self.config.variant) {
            Ok(report) => self.submit_with_context(ctx, report),
            Err(e) => Err(self.reject(ctx, payload, e)),
        }
    }

    /// Derive the published status from every stored report.
    pub fn current_status(&self) -> Result<StatusSnapshot> {
        self.current_status_with_context(&RequestContext::new())
    }

    pub fn current_status_with_context(&self, ctx: &RequestContext) -> Result<StatusSnapshot> {
        let log_ctx = ctx.log_context();
        let stored = self.load_reports(ctx)?;
        let reports: Vec<Report> = stored.iter().map(|s| s.report).collect();

        let snapshot = decide(&reports, &self.config, &log_ctx);

        log_info!(
            log_ctx,
            "STATUS_COMPUTED",
            state = snapshot.state.as_str(),
            reports = snapshot.tally.total,
            flooded = snapshot.tally.flooded,
        );
        Ok(snapshot)
    }

    /// Status plus the text the page renders for it.
    pub fn status_view(&self, ctx: &RequestContext) -> Result<StatusView> {
        let snapshot = self.current_status_with_context(ctx)?;
        Ok(StatusView::from_snapshot(&snapshot, &self.config))
    }

    /// Every stored report, in insertion order.
    pub fn load_reports(&self, ctx: &RequestContext) -> Result<Vec<StoredReport>> {
        self.repository.load_all().map_err(|e| {
            log_error!(ctx.log_context(), "STORAGE_READ_FAILED", reason = e.reason);
            FloodWatchError::from(e)
        })
    }

    fn reject(&self, ctx: &RequestContext, raw: &str, error: InvalidReportError) -> FloodWatchError {
        let record = rejected_submission(&ctx.request_id, raw, &error);
        log_warn!(
            ctx.log_context(),
            "REPORT_REJECTED",
            reason = record.rejection_reason,
            content_hash = record.content_hash,
        );
        FloodWatchError::InvalidReport(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsensusVariant;
    use crate::consensus::decision::FloodState;
    use crate::error::StorageUnavailableError;
    use crate::storage::models::ImpactCategory;

    struct UnavailableRepository;

    impl ReportRepository for UnavailableRepository {
        fn append(&self, _report: Report) -> std::result::Result<StoredReport, StorageUnavailableError> {
            Err(StorageUnavailableError::new("connection refused"))
        }

        fn load_all(&self) -> std::result::Result<Vec<StoredReport>, StorageUnavailableError> {
            Err(StorageUnavailableError::new("connection refused"))
        }
    }

    fn depth_engine() -> ConsensusEngine<InMemoryReportRepository> {
        ConsensusEngine::new(
            Arc::new(InMemoryReportRepository::new()),
            ConsensusConfig::for_variant(ConsensusVariant::Depth),
        )
    }

    #[test]
    fn test_empty_engine_is_monitoring() {
        let engine = depth_engine();
        assert_eq!(engine.current_status().unwrap().state, FloodState::Monitoring);
    }

    #[test]
    fn test_submit_then_status() {
        let engine = depth_engine();
        engine.submit(Report::flooded_with_depth(0.5)).unwrap();
        engine.submit(Report::flooded_with_depth(0.6)).unwrap();
        engine.submit(Report::not_flooded()).unwrap();

        let snapshot = engine.current_status().unwrap();
        assert_eq!(snapshot.state, FloodState::Flooding);
        assert!((snapshot.average_depth().unwrap() - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_report_is_not_stored() {
        let engine = depth_engine();
        let err = engine.submit(Report::flooded_with_depth(-1.0)).unwrap_err();
        assert_eq!(
            err,
            FloodWatchError::InvalidReport(InvalidReportError::NegativeDepth(-1.0))
        );

        let err = engine
            .submit(Report::flooded_with_impact(ImpactCategory::CarBlocked))
            .unwrap_err();
        assert!(matches!(
            err,
            FloodWatchError::InvalidReport(InvalidReportError::VariantMismatch { .. })
        ));

        assert_eq!(engine.repository().count().unwrap(), 0);
    }

    #[test]
    fn test_submit_json_and_payload() {
        let engine = depth_engine();
        let ctx = RequestContext::new();

        let stored = engine
            .submit_json(&ctx, r#"{"flooded": "yes", "depth_meters": 0.4}"#)
            .unwrap();
        assert_eq!(stored.report, Report::flooded_with_depth(0.4));

        let err = engine.submit_json(&ctx, r#"{"depth_meters": 0.4}"#).unwrap_err();
        assert_eq!(
            err,
            FloodWatchError::InvalidReport(InvalidReportError::MissingFloodedFlag)
        );

        let submission = ReportSubmission::from_form(Some("no"), None, None).unwrap();
        let stored = engine.submit_payload(&ctx, &submission).unwrap();
        assert_eq!(stored.report, Report::not_flooded());

        assert_eq!(engine.repository().count().unwrap(), 2);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let engine = ConsensusEngine::new(Arc::new(UnavailableRepository), ConsensusConfig::default());

        assert!(matches!(
            engine.submit(Report::not_flooded()),
            Err(FloodWatchError::StorageUnavailable(_))
        ));
        assert!(matches!(
            engine.current_status(),
            Err(FloodWatchError::StorageUnavailable(_))
        ));
        assert!(matches!(
            engine.status_view(&RequestContext::new()),
            Err(FloodWatchError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_status_view_counts_reports() {
        let engine = ConsensusEngine::new(
            Arc::new(InMemoryReportRepository::new()),
            ConsensusConfig::default(),
        );
        engine
            .submit(Report::flooded_with_impact(ImpactCategory::Walkable))
            .unwrap();

        let view = engine.status_view(&RequestContext::new()).unwrap();
        assert_eq!(view.status, "Monitoring");
        assert_eq!(view.report_count, 1);
    }

    fn depth_row(id: i64, depth_meters: Option<f64>, impact_category: Option<&str>) -> ReportRow {
        ReportRow {
            id,
            is_flooded: true,
            depth_meters,
            impact_category: impact_category.map(str::to_string),
            received_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_from_rows_computes_status() {
        let engine = ConsensusEngine::from_rows(
            &RequestContext::new(),
            vec![
                depth_row(1, Some(0.5), None),
                depth_row(2, Some(0.6), None),
                depth_row(3, None, None),
            ],
            ConsensusConfig::for_variant(ConsensusVariant::Depth),
        )
        .unwrap();

        let view = engine.status_view(&RequestContext::new()).unwrap();
        assert_eq!(view.status, "Flooding");
        assert_eq!(view.level_label.as_deref(), Some("0.55 m"));
    }

    #[test]
    fn test_from_rows_rejects_invalid_persisted_rows() {
        let config = ConsensusConfig::for_variant(ConsensusVariant::Depth);

        let negative = ConsensusEngine::from_rows(
            &RequestContext::new(),
            vec![
                depth_row(1, Some(-0.5), None),
                depth_row(2, Some(-0.4), None),
                depth_row(3, Some(0.2), None),
            ],
            config.clone(),
        );
        assert!(matches!(
            negative,
            Err(FloodWatchError::InvalidReport(InvalidReportError::NegativeDepth(_)))
        ));

        let other_variant = ConsensusEngine::from_rows(
            &RequestContext::new(),
            vec![
                depth_row(1, Some(0.5), None),
                depth_row(2, Some(0.5), None),
                depth_row(3, None, Some("car")),
            ],
            config,
        );
        assert!(matches!(
            other_variant,
            Err(FloodWatchError::InvalidReport(InvalidReportError::VariantMismatch { .. }))
        ));
    }

    #[test]
    fn test_clones_share_the_collection() {
        let engine = depth_engine();
        let other = engine.clone();
        other.submit(Report::not_flooded()).unwrap();
        assert_eq!(engine.current_status().unwrap().tally.total, 1);
    }
}
