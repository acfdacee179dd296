//! FloodWatch Core - consensus engine for crowd-sourced flood reports
//!
//! This crate decides what the public flood page shows from the reports
//! people submit, and is exposed to the Python web layer via PyO3 (behind
//! the `python` feature). The implementation prioritizes:
//!
//! 1. **Honesty** - a storage failure is an error, never a default status
//! 2. **Logging** - every decision point logged with request context
//! 3. **Determinism** - status is a pure function of the stored reports
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - The consensus engine and per-request context
//! - `consensus` - Monitoring/dry/flooding decision and page view
//! - `validation` - Submission parsing and checks
//! - `storage` - Report models, repositories, SQL builders
//! - `chat` - LINE webhook verification and status replies
//! - `config` - Thresholds and secrets from the environment
//! - `logging` - Structured logging with request context

pub mod chat;
pub mod config;
pub mod consensus;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod validation;

#[cfg(feature = "python")]
mod python;

pub use crate::config::{ChatConfig, ConsensusConfig, ConsensusVariant};
pub use consensus::{ConsensusDetail, FloodState, StatusSnapshot, StatusView, WithheldReason};
pub use error::{FloodWatchError, InvalidReportError, Result, StorageUnavailableError};
pub use pipeline::{ConsensusEngine, RequestContext};
pub use storage::{ImpactCategory, InMemoryReportRepository, Reading, Report, ReportRepository, StoredReport};
pub use validation::ReportSubmission;
