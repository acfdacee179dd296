//! Consensus decision logic.
//!
//! Derives the published flood state from the full report collection.

use serde::{Deserialize, Serialize};

use crate::config::{ConsensusConfig, ConsensusVariant};
use crate::consensus::tally::{average, depth_spread, depths_consistent, majority_category};
use crate::logging::structured::LogContext;
use crate::storage::models::{ImpactCategory, Report};

/// Published state. Recomputed on every query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodState {
    Monitoring,
    Dry,
    Flooding,
}

impl FloodState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodState::Monitoring => "monitoring",
            FloodState::Dry => "dry",
            FloodState::Flooding => "flooding",
        }
    }
}

/// The representative value published alongside FLOODING.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConsensusDetail {
    AverageDepth(f64),
    Impact(ImpactCategory),
}

/// Why FLOODING was published without a detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithheldReason {
    /// No flooded report carried a reading.
    NoReadings,
    /// Readings spread too far, or no category held a majority.
    Disagreement,
}

impl WithheldReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithheldReason::NoReadings => "no_readings",
            WithheldReason::Disagreement => "disagreement",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTally {
    pub total: usize,
    pub flooded: usize,
}

impl ReportTally {
    pub fn from_reports(reports: &[Report]) -> Self {
        Self {
            total: reports.len(),
            flooded: reports.iter().filter(|r| r.is_flooded).count(),
        }
    }

    /// Share of flooded reports. Zero for an empty collection.
    pub fn flooding_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.flooded as f64 / self.total as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: FloodState,
    pub confidence_detail: Option<ConsensusDetail>,
    pub withheld: Option<WithheldReason>,
    pub tally: ReportTally,
}

impl StatusSnapshot {
    pub fn monitoring(tally: ReportTally) -> Self {
        Self {
            state: FloodState::Monitoring,
            confidence_detail: None,
            withheld: None,
            tally,
        }
    }

    pub fn dry(tally: ReportTally) -> Self {
        Self {
            state: FloodState::Dry,
            confidence_detail: None,
            withheld: None,
            tally,
        }
    }

    pub fn flooding(tally: ReportTally, detail: ConsensusDetail) -> Self {
        Self {
            state: FloodState::Flooding,
            confidence_detail: Some(detail),
            withheld: None,
            tally,
        }
    }

    pub fn flooding_withheld(tally: ReportTally, reason: WithheldReason) -> Self {
        Self {
            state: FloodState::Flooding,
            confidence_detail: None,
            withheld: Some(reason),
            tally,
        }
    }

    pub fn average_depth(&self) -> Option<f64> {
        match self.confidence_detail {
            Some(ConsensusDetail::AverageDepth(depth)) => Some(depth),
            _ => None,
        }
    }

    pub fn impact_category(&self) -> Option<ImpactCategory> {
        match self.confidence_detail {
            Some(ConsensusDetail::Impact(category)) => Some(category),
            _ => None,
        }
    }
}

/// Decide the published status from every report, in insertion order.
///
/// # Decision Tree
/// 1. Fewer than `min_reports` reports -> Monitoring
/// 2. Flooded share below `flooding_ratio` -> Dry
/// 3. Otherwise Flooding, with a detail when flooded readings agree:
///    - depth: spread within `max_depth_spread` (inclusive) -> average depth
///    - impact: one category held by more than half -> that category
pub fn decide(reports: &[Report], config: &ConsensusConfig, ctx: &LogContext) -> StatusSnapshot {
    let tally = ReportTally::from_reports(reports);

    if tally.total < config.min_reports {
        log::debug!(
            "{} CONSENSUS_DECISION state=monitoring reports={} min_reports={}",
            ctx,
            tally.total,
            config.min_reports
        );
        return StatusSnapshot::monitoring(tally);
    }

    let ratio = tally.flooding_ratio();
    if ratio < config.flooding_ratio {
        log::debug!(
            "{} CONSENSUS_DECISION state=dry flooded={} reports={} ratio={:.3}",
            ctx,
            tally.flooded,
            tally.total,
            ratio
        );
        return StatusSnapshot::dry(tally);
    }

    let flooded = reports.iter().filter(|r| r.is_flooded);

    match config.variant {
        ConsensusVariant::Depth => {
            let depths: Vec<f64> = flooded.filter_map(|r| r.reading.depth_meters()).collect();
            decide_depth(tally, &depths, config, ctx)
        }
        ConsensusVariant::Impact => {
            let categories: Vec<ImpactCategory> =
                flooded.filter_map(|r| r.reading.impact_category()).collect();
            decide_impact(tally, &categories, ctx)
        }
    }
}

fn decide_depth(
    tally: ReportTally,
    depths: &[f64],
    config: &ConsensusConfig,
    ctx: &LogContext,
) -> StatusSnapshot {
    if depths.is_empty() {
        log::info!("{} CONSENSUS_DECISION state=flooding detail=none reason=no_readings", ctx);
        return StatusSnapshot::flooding_withheld(tally, WithheldReason::NoReadings);
    }

    if !depths_consistent(depths, config.max_depth_spread) {
        log::info!(
            "{} CONSENSUS_DECISION state=flooding detail=none reason=spread spread={:.3} limit={}",
            ctx,
            depth_spread(depths).unwrap_or_default(),
            config.max_depth_spread
        );
        return StatusSnapshot::flooding_withheld(tally, WithheldReason::Disagreement);
    }

    match average(depths) {
        Some(avg) => {
            log::info!(
                "{} CONSENSUS_DECISION state=flooding average_depth={:.3} readings={}",
                ctx,
                avg,
                depths.len()
            );
            StatusSnapshot::flooding(tally, ConsensusDetail::AverageDepth(avg))
        }
        None => StatusSnapshot::flooding_withheld(tally, WithheldReason::NoReadings),
    }
}

fn decide_impact(tally: ReportTally, categories: &[ImpactCategory], ctx: &LogContext) -> StatusSnapshot {
    if categories.is_empty() {
        log::info!("{} CONSENSUS_DECISION state=flooding detail=none reason=no_readings", ctx);
        return StatusSnapshot::flooding_withheld(tally, WithheldReason::NoReadings);
    }

    match majority_category(categories) {
        Some(category) => {
            log::info!(
                "{} CONSENSUS_DECISION state=flooding category={} votes={}",
                ctx,
                category,
                categories.len()
            );
            StatusSnapshot::flooding(tally, ConsensusDetail::Impact(category))
        }
        None => {
            log::info!(
                "{} CONSENSUS_DECISION state=flooding detail=none reason=no_majority votes={}",
                ctx,
                categories.len()
            );
            StatusSnapshot::flooding_withheld(tally, WithheldReason::Disagreement)
        }
    }
}
