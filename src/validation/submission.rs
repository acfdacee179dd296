//! Submission validation.
//!
//! Turns a raw boundary payload (HTML form or JSON) into a typed [`Report`],
//! or explains why it cannot be stored.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::ConsensusVariant;
use crate::error::InvalidReportError;
use crate::log_warn;
use crate::logging::structured::LogContext;
use crate::storage::models::{
    ImpactCategory, Reading, RejectedSubmission, Report, ReportRow, StoredReport,
};

/// The flooded answer as it arrives: a JSON bool or a form word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FloodedAnswer {
    Flag(bool),
    Word(String),
}

/// Raw submission payload. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSubmission {
    #[serde(default)]
    pub flooded: Option<FloodedAnswer>,
    #[serde(default)]
    pub depth_meters: Option<f64>,
    #[serde(default, alias = "impact_category")]
    pub level_category: Option<String>,
}

impl ReportSubmission {
    /// Build from form fields. Empty strings count as absent.
    pub fn from_form(
        flooded: Option<&str>,
        level_category: Option<&str>,
        depth_meters: Option<&str>,
    ) -> Result<Self, InvalidReportError> {
        let depth_meters = match non_empty(depth_meters) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                InvalidReportError::MalformedPayload(format!("depth {:?} is not a number", raw))
            })?),
            None => None,
        };

        Ok(Self {
            flooded: non_empty(flooded).map(|w| FloodedAnswer::Word(w.to_string())),
            depth_meters,
            level_category: non_empty(level_category).map(str::to_string),
        })
    }

    /// Parse a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, InvalidReportError> {
        serde_json::from_str(payload)
            .map_err(|e| InvalidReportError::MalformedPayload(format!("JSON parse error: {}", e)))
    }

    /// Validate against the deployment's variant.
    ///
    /// A not-flooded answer drops its reading once the reading itself has
    /// been checked.
    pub fn validate(&self, variant: ConsensusVariant) -> Result<Report, InvalidReportError> {
        let is_flooded = match &self.flooded {
            None => return Err(InvalidReportError::MissingFloodedFlag),
            Some(FloodedAnswer::Flag(flag)) => *flag,
            Some(FloodedAnswer::Word(word)) => parse_flooded_word(word)?,
        };

        let category = match non_empty(self.level_category.as_deref()) {
            Some(raw) => Some(raw.parse::<ImpactCategory>()?),
            None => None,
        };

        let reading = match (self.depth_meters, category) {
            (None, None) => Reading::None,
            (Some(depth), None) => Reading::Depth(depth),
            (None, Some(category)) => Reading::Impact(category),
            (Some(_), Some(_)) => {
                return Err(InvalidReportError::VariantMismatch {
                    expected: variant,
                    reading: "depth and impact",
                })
            }
        };

        let report = Report {
            is_flooded,
            reading,
        };
        validate_report(&report, variant)?;

        if !is_flooded {
            return Ok(Report::not_flooded());
        }
        Ok(report)
    }
}

/// Check a typed report before it is stored.
pub fn validate_report(report: &Report, variant: ConsensusVariant) -> Result<(), InvalidReportError> {
    match (report.reading, variant) {
        (Reading::None, _) => Ok(()),
        (Reading::Depth(depth), ConsensusVariant::Depth) => {
            if !depth.is_finite() {
                Err(InvalidReportError::NonFiniteDepth)
            } else if depth < 0.0 {
                Err(InvalidReportError::NegativeDepth(depth))
            } else {
                Ok(())
            }
        }
        (Reading::Impact(_), ConsensusVariant::Impact) => Ok(()),
        (reading, expected) => Err(InvalidReportError::VariantMismatch {
            expected,
            reading: reading.kind(),
        }),
    }
}

/// Validate form fields without storing them.
///
/// For callers that persist reports themselves; the result feeds
/// [`Report::column_values`] and the `reports` insert.
pub fn validate_form(
    variant: ConsensusVariant,
    flooded: Option<&str>,
    level_category: Option<&str>,
    depth_meters: Option<&str>,
) -> Result<Report, InvalidReportError> {
    ReportSubmission::from_form(flooded, level_category, depth_meters)?.validate(variant)
}

/// Re-check rows loaded from the durable store before the engine sees them.
///
/// The first bad row fails the whole load; nothing is skipped or coerced.
pub fn validate_rows(
    rows: Vec<ReportRow>,
    variant: ConsensusVariant,
    ctx: &LogContext,
) -> Result<Vec<StoredReport>, InvalidReportError> {
    rows.into_iter()
        .map(|row| {
            let row_id = row.id;
            StoredReport::try_from(row)
                .and_then(|stored| validate_report(&stored.report, variant).map(|()| stored))
                .map_err(|e| {
                    log_warn!(ctx, "STORED_ROW_REJECTED", row_id = row_id, reason = e.to_string());
                    e
                })
        })
        .collect()
}

/// Build the log record for a refused payload.
pub fn rejected_submission(
    request_id: &str,
    raw_payload: &str,
    error: &InvalidReportError,
) -> RejectedSubmission {
    RejectedSubmission {
        request_id: request_id.to_string(),
        content_hash: compute_hash(raw_payload),
        rejection_reason: error.to_string(),
        received_at: Utc::now(),
    }
}

/// Compute SHA256 hash of content.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_flooded_word(word: &str) -> Result<bool, InvalidReportError> {
    match word.trim().to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(InvalidReportError::UnrecognizedFloodedValue(word.to_string())),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
