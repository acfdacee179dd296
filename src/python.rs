//! Python bindings.
//!
//! The Flask layer owns HTTP and templates; it hands form fields, webhook
//! bodies and stored rows to this module and renders what comes back.

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::chat::reply::reply_for_message;
use crate::chat::webhook::handle_webhook;
use crate::config::{ChatConfig, ConsensusConfig, ConsensusVariant};
use crate::consensus::decision::StatusSnapshot;
use crate::consensus::view::StatusView;
use crate::error::{ConfigError, FloodWatchError};
use crate::logging::init_logger;
use crate::pipeline::context::RequestContext;
use crate::pipeline::engine::ConsensusEngine;
use crate::storage::models::{parse_received_at, Report, ReportRow};
use crate::storage::queries::{build_report_insert, build_reports_table_ddl};
use crate::storage::repository::{InMemoryReportRepository, ReportRepository};
use crate::validation::submission::{rejected_submission, validate_form, ReportSubmission};

fn to_py_err(err: FloodWatchError) -> PyErr {
    match err {
        FloodWatchError::InvalidReport(e) => PyValueError::new_err(e.to_string()),
        FloodWatchError::StorageUnavailable(e) => PyRuntimeError::new_err(e.to_string()),
    }
}

fn config_err(err: ConfigError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_variant(variant: &str) -> PyResult<ConsensusVariant> {
    variant.parse().map_err(config_err)
}

fn request_context(request_id: Option<&str>) -> RequestContext {
    match request_id {
        Some(id) => RequestContext::with_id(id),
        None => RequestContext::new(),
    }
}

fn snapshot_dict<'py>(py: Python<'py>, snapshot: &StatusSnapshot) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("state", snapshot.state.as_str())?;
    dict.set_item("average_depth", snapshot.average_depth())?;
    dict.set_item("impact_category", snapshot.impact_category().map(|c| c.as_str()))?;
    dict.set_item("withheld", snapshot.withheld.map(|w| w.as_str()))?;
    dict.set_item("report_count", snapshot.tally.total)?;
    dict.set_item("flooded_count", snapshot.tally.flooded)?;
    Ok(dict)
}

fn view_dict<'py>(py: Python<'py>, view: &StatusView) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("status", &view.status)?;
    dict.set_item("message", &view.message)?;
    dict.set_item("is_flooding", view.is_flooding)?;
    dict.set_item("level", view.level)?;
    dict.set_item("level_label", view.level_label.as_deref())?;
    dict.set_item("report_count", view.report_count)?;
    dict.set_item("min_reports", view.min_reports)?;
    Ok(dict)
}

/// One deployment's engine, backed by process memory.
#[pyclass]
struct FloodWatch {
    engine: ConsensusEngine<InMemoryReportRepository>,
    chat: ChatConfig,
}

#[pymethods]
impl FloodWatch {
    #[new]
    #[pyo3(signature = (variant=None))]
    fn new(variant: Option<&str>) -> PyResult<Self> {
        init_logger();

        let mut config = ConsensusConfig::from_env().map_err(config_err)?;
        if let Some(variant) = variant {
            config.variant = parse_variant(variant)?;
        }

        log::info!(
            "ENGINE_STARTED variant={} min_reports={} flooding_ratio={}",
            config.variant,
            config.min_reports,
            config.flooding_ratio
        );

        Ok(Self {
            engine: ConsensusEngine::new(Arc::new(InMemoryReportRepository::new()), config),
            chat: ChatConfig::from_env().map_err(config_err)?,
        })
    }

    /// Record a form submission. Returns the report id.
    #[pyo3(signature = (flooded, level_category=None, depth_meters=None, request_id=None))]
    fn submit_form(
        &self,
        flooded: Option<&str>,
        level_category: Option<&str>,
        depth_meters: Option<&str>,
        request_id: Option<&str>,
    ) -> PyResult<u64> {
        let ctx = request_context(request_id);
        let submission = ReportSubmission::from_form(flooded, level_category, depth_meters)
            .map_err(|e| to_py_err(e.into()))?;
        let stored = self.engine.submit_payload(&ctx, &submission).map_err(to_py_err)?;
        Ok(stored.id)
    }

    /// Record a JSON submission. Returns the report id.
    #[pyo3(signature = (payload, request_id=None))]
    fn submit_json(&self, payload: &str, request_id: Option<&str>) -> PyResult<u64> {
        let ctx = request_context(request_id);
        let stored = self.engine.submit_json(&ctx, payload).map_err(to_py_err)?;
        Ok(stored.id)
    }

    fn current_status(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        let snapshot = self.engine.current_status().map_err(to_py_err)?;
        Ok(snapshot_dict(py, &snapshot)?.into())
    }

    fn status_view(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        let view = self
            .engine
            .status_view(&RequestContext::new())
            .map_err(to_py_err)?;
        Ok(view_dict(py, &view)?.into())
    }

    fn report_count(&self) -> PyResult<usize> {
        self.engine
            .repository()
            .count()
            .map_err(|e| to_py_err(e.into()))
    }

    /// Reply text for a chat message, or None.
    fn line_reply(&self, text: &str) -> PyResult<Option<String>> {
        let reports: Vec<Report> = self
            .engine
            .load_reports(&RequestContext::new())
            .map_err(to_py_err)?
            .iter()
            .map(|s| s.report)
            .collect();
        Ok(reply_for_message(text, &reports))
    }

    /// Handle a LINE webhook. Returns (http_status, [(reply_token, text)]).
    #[pyo3(signature = (body, signature=None))]
    fn handle_line_webhook(
        &self,
        body: &str,
        signature: Option<&str>,
    ) -> PyResult<(u16, Vec<(String, String)>)> {
        let ctx = RequestContext::new();
        match handle_webhook(&self.chat, &self.engine, &ctx, body, signature) {
            Ok(replies) => Ok((
                200,
                replies
                    .into_iter()
                    .map(|r| (r.reply_token, r.text))
                    .collect(),
            )),
            Err(e) => {
                log::warn!("{} WEBHOOK_REJECTED error={}", ctx.log_context(), e);
                Ok((e.status_code(), Vec::new()))
            }
        }
    }
}

/// CREATE TABLE statement for the reports table.
#[pyfunction]
fn reports_table_ddl(variant: &str) -> PyResult<String> {
    Ok(build_reports_table_ddl(parse_variant(variant)?))
}

/// INSERT statement for one validated report.
#[pyfunction]
fn report_insert_sql(variant: &str) -> PyResult<String> {
    Ok(build_report_insert(parse_variant(variant)?))
}

/// Validate form fields for a caller that persists reports itself.
///
/// Returns `(is_flooded, depth_meters, impact_category)`; bind `is_flooded`
/// and the variant's reading to `report_insert_sql`. Raises ValueError with
/// the same reasons the in-memory engine gives.
#[pyfunction]
#[pyo3(signature = (variant, flooded, level_category=None, depth_meters=None, request_id=None))]
fn validate_submission(
    variant: &str,
    flooded: Option<&str>,
    level_category: Option<&str>,
    depth_meters: Option<&str>,
    request_id: Option<&str>,
) -> PyResult<(bool, Option<f64>, Option<&'static str>)> {
    init_logger();

    let ctx = request_context(request_id);
    match validate_form(parse_variant(variant)?, flooded, level_category, depth_meters) {
        Ok(report) => Ok(report.column_values()),
        Err(e) => {
            let raw = format!("{:?}", (flooded, level_category, depth_meters));
            let record = rejected_submission(&ctx.request_id, &raw, &e);
            log::warn!(
                "{} REPORT_REJECTED reason={} content_hash={}",
                ctx.log_context(),
                record.rejection_reason,
                record.content_hash
            );
            Err(to_py_err(e.into()))
        }
    }
}

/// Compute the page view from rows loaded by the storage collaborator.
///
/// # Arguments
/// * `rows` - (id, is_flooded, depth_meters, impact_category, received_at RFC 3339)
/// * `variant` - "depth" or "impact"
#[pyfunction]
fn status_from_rows(
    py: Python<'_>,
    rows: Vec<(i64, bool, Option<f64>, Option<String>, String)>,
    variant: &str,
) -> PyResult<Py<PyAny>> {
    init_logger();

    let mut config = ConsensusConfig::from_env().map_err(config_err)?;
    config.variant = parse_variant(variant)?;

    let mut parsed = Vec::with_capacity(rows.len());
    for (id, is_flooded, depth_meters, impact_category, received_at) in rows {
        parsed.push(ReportRow {
            id,
            is_flooded,
            depth_meters,
            impact_category,
            received_at: parse_received_at(&received_at).map_err(|e| to_py_err(e.into()))?,
        });
    }

    let ctx = RequestContext::new();
    let engine = ConsensusEngine::from_rows(&ctx, parsed, config).map_err(to_py_err)?;
    let view = engine.status_view(&ctx).map_err(to_py_err)?;
    Ok(view_dict(py, &view)?.into())
}

/// Python module definition
#[pymodule]
fn floodwatch_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<FloodWatch>()?;
    m.add_function(wrap_pyfunction!(reports_table_ddl, m)?)?;
    m.add_function(wrap_pyfunction!(report_insert_sql, m)?)?;
    m.add_function(wrap_pyfunction!(validate_submission, m)?)?;
    m.add_function(wrap_pyfunction!(status_from_rows, m)?)?;
    Ok(())
}
