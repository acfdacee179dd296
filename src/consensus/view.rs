//! Presentation data for the public status page.

use serde::{Deserialize, Serialize};

use crate::config::ConsensusConfig;
use crate::consensus::decision::{ConsensusDetail, FloodState, StatusSnapshot, WithheldReason};

pub const MONITORING_MESSAGE: &str = "Waiting for more community reports...";
pub const DRY_MESSAGE: &str = "Most recent reports indicate normal conditions.";
pub const PENDING_LEVEL_MESSAGE: &str = "Flooding reported. Flood level data pending.";
pub const VARYING_MESSAGE: &str = "Flooding reported, but measurements vary. Stay alert.";
pub const VERIFIED_MESSAGE: &str = "Community verified flooding in the area.";

/// What the page template renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub status: String,
    pub message: String,
    pub is_flooding: bool,
    /// Average depth in meters, when agreed.
    pub level: Option<f64>,
    pub level_label: Option<String>,
    pub report_count: usize,
    pub min_reports: usize,
}

impl StatusView {
    pub fn from_snapshot(snapshot: &StatusSnapshot, config: &ConsensusConfig) -> Self {
        let status = match snapshot.state {
            FloodState::Monitoring => "Monitoring",
            FloodState::Dry => "Dry",
            FloodState::Flooding => "Flooding",
        };

        let (message, level, level_label) = match (snapshot.state, snapshot.confidence_detail) {
            (FloodState::Monitoring, _) => (MONITORING_MESSAGE.to_string(), None, None),
            (FloodState::Dry, _) => (DRY_MESSAGE.to_string(), None, None),
            (FloodState::Flooding, Some(ConsensusDetail::Impact(category))) => (
                category.status_message().to_string(),
                None,
                Some(category.label().to_string()),
            ),
            (FloodState::Flooding, Some(ConsensusDetail::AverageDepth(depth))) => (
                VERIFIED_MESSAGE.to_string(),
                Some(depth),
                Some(format!("{:.2} m", depth)),
            ),
            (FloodState::Flooding, None) => {
                let message = match snapshot.withheld {
                    Some(WithheldReason::Disagreement) => VARYING_MESSAGE,
                    Some(WithheldReason::NoReadings) | None => PENDING_LEVEL_MESSAGE,
                };
                (message.to_string(), None, None)
            }
        };

        Self {
            status: status.to_string(),
            message,
            is_flooding: snapshot.state == FloodState::Flooding,
            level,
            level_label,
            report_count: snapshot.tally.total,
            min_reports: config.min_reports,
        }
    }
}
