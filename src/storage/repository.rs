//! Report repositories.
//!
//! The engine reads and writes reports only through [`ReportRepository`], so
//! the in-memory store used by a single process and a database-backed store
//! are interchangeable.

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::StorageUnavailableError;
use crate::storage::models::{Report, StoredReport};

/// Append-only report storage.
///
/// Implementations must serialise appends: concurrent callers never lose a
/// report and never observe a half-written one. Ids are assigned by the
/// repository and strictly increase in insertion order.
pub trait ReportRepository: Send + Sync {
    /// Store a report, stamping its id and `received_at`.
    fn append(&self, report: Report) -> Result<StoredReport, StorageUnavailableError>;

    /// Every stored report, in insertion order.
    fn load_all(&self) -> Result<Vec<StoredReport>, StorageUnavailableError>;

    fn count(&self) -> Result<usize, StorageUnavailableError> {
        Ok(self.load_all()?.len())
    }
}

/// Process-lifetime storage. Starts empty; nothing to tear down.
#[derive(Debug, Default)]
pub struct InMemoryReportRepository {
    reports: RwLock<Vec<StoredReport>>,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from reports that were persisted elsewhere, e.g. on restart.
    ///
    /// Rows are re-ordered by id so later appends keep ids increasing.
    pub fn with_reports(mut reports: Vec<StoredReport>) -> Self {
        reports.sort_by_key(|r| r.id);
        Self {
            reports: RwLock::new(reports),
        }
    }
}

impl ReportRepository for InMemoryReportRepository {
    fn append(&self, report: Report) -> Result<StoredReport, StorageUnavailableError> {
        let mut reports = self.reports.write();
        let id = reports.last().map(|r| r.id + 1).unwrap_or(1);
        let stored = StoredReport {
            id,
            report,
            received_at: Utc::now(),
        };
        reports.push(stored);
        Ok(stored)
    }

    fn load_all(&self) -> Result<Vec<StoredReport>, StorageUnavailableError> {
        Ok(self.reports.read().clone())
    }

    fn count(&self) -> Result<usize, StorageUnavailableError> {
        Ok(self.reports.read().len())
    }
}
