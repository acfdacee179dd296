//! Report models.
//!
//! These models represent reports as the engine sees them and as they sit in
//! the `reports` table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidReportError;

/// How badly a flood blocks traffic, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactCategory {
    #[serde(rename = "walkable")]
    Walkable,
    #[serde(rename = "motorcycle")]
    MotorcycleBlocked,
    #[serde(rename = "car")]
    CarBlocked,
}

impl ImpactCategory {
    pub const ALL: [ImpactCategory; 3] = [
        ImpactCategory::Walkable,
        ImpactCategory::MotorcycleBlocked,
        ImpactCategory::CarBlocked,
    ];

    /// Wire name used by forms and the `impact_category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactCategory::Walkable => "walkable",
            ImpactCategory::MotorcycleBlocked => "motorcycle",
            ImpactCategory::CarBlocked => "car",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactCategory::Walkable => "walkable",
            ImpactCategory::MotorcycleBlocked => "Motorcycle can't pass",
            ImpactCategory::CarBlocked => "Car can't pass",
        }
    }

    /// Message shown on the public page when this category is agreed.
    pub fn status_message(&self) -> &'static str {
        match self {
            ImpactCategory::Walkable => {
                "Flooding reported, but streets remain walkable. Avoid low spots."
            }
            ImpactCategory::MotorcycleBlocked => {
                "Flooding confirmed and deep enough to stop motorcycles. Seek alternate routes."
            }
            ImpactCategory::CarBlocked => {
                "Severe flooding reported. Roads are impassable for cars. Avoid the area."
            }
        }
    }

    /// Thai phrase used in chat replies.
    pub fn thai_phrase(&self) -> &'static str {
        match self {
            ImpactCategory::Walkable => "ยังสามารถเดินผ่านได้",
            ImpactCategory::MotorcycleBlocked => "รถจักรยานยนต์ผ่านไม่ได้",
            ImpactCategory::CarBlocked => "รถยนต์ผ่านไม่ได้",
        }
    }
}

impl fmt::Display for ImpactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImpactCategory {
    type Err = InvalidReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "walkable" | "WALKABLE" => Ok(ImpactCategory::Walkable),
            "motorcycle" | "MOTORCYCLE_BLOCKED" => Ok(ImpactCategory::MotorcycleBlocked),
            "car" | "CAR_BLOCKED" => Ok(ImpactCategory::CarBlocked),
            other => Err(InvalidReportError::UnrecognizedImpactCategory(
                other.to_string(),
            )),
        }
    }
}

/// The optional measurement attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reading {
    None,
    Depth(f64),
    Impact(ImpactCategory),
}

impl Reading {
    pub fn kind(&self) -> &'static str {
        match self {
            Reading::None => "none",
            Reading::Depth(_) => "depth",
            Reading::Impact(_) => "impact",
        }
    }

    pub fn depth_meters(&self) -> Option<f64> {
        match self {
            Reading::Depth(d) => Some(*d),
            _ => None,
        }
    }

    pub fn impact_category(&self) -> Option<ImpactCategory> {
        match self {
            Reading::Impact(c) => Some(*c),
            _ => None,
        }
    }
}

/// One user's flood observation, validated but not yet stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub is_flooded: bool,
    pub reading: Reading,
}

impl Report {
    /// Values for the `reports` insert: `(is_flooded, depth_meters, impact_category)`.
    pub fn column_values(&self) -> (bool, Option<f64>, Option<&'static str>) {
        (
            self.is_flooded,
            self.reading.depth_meters(),
            self.reading.impact_category().map(|c| c.as_str()),
        )
    }

    pub fn flooded(reading: Reading) -> Self {
        Self {
            is_flooded: true,
            reading,
        }
    }

    pub fn not_flooded() -> Self {
        Self {
            is_flooded: false,
            reading: Reading::None,
        }
    }

    pub fn flooded_with_depth(depth_meters: f64) -> Self {
        Self::flooded(Reading::Depth(depth_meters))
    }

    pub fn flooded_with_impact(category: ImpactCategory) -> Self {
        Self::flooded(Reading::Impact(category))
    }
}

/// A report as held by a repository. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: u64,
    pub report: Report,
    pub received_at: DateTime<Utc>,
}

/// A row of the `reports` table, as loaded by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: i64,
    pub is_flooded: bool,
    pub depth_meters: Option<f64>,
    pub impact_category: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl From<&StoredReport> for ReportRow {
    fn from(stored: &StoredReport) -> Self {
        Self {
            id: stored.id as i64,
            is_flooded: stored.report.is_flooded,
            depth_meters: stored.report.reading.depth_meters(),
            impact_category: stored
                .report
                .reading
                .impact_category()
                .map(|c| c.as_str().to_string()),
            received_at: stored.received_at,
        }
    }
}

impl TryFrom<ReportRow> for StoredReport {
    type Error = InvalidReportError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let reading = match (row.depth_meters, row.impact_category.as_deref()) {
            (None, None) => Reading::None,
            (Some(depth), None) => Reading::Depth(depth),
            (None, Some(category)) => Reading::Impact(category.parse()?),
            (Some(_), Some(_)) => {
                return Err(InvalidReportError::MalformedPayload(format!(
                    "row {} carries both depth and impact category",
                    row.id
                )))
            }
        };

        let id = u64::try_from(row.id).map_err(|_| {
            InvalidReportError::MalformedPayload(format!("row id {} is negative", row.id))
        })?;

        Ok(Self {
            id,
            report: Report {
                is_flooded: row.is_flooded,
                reading,
            },
            received_at: row.received_at,
        })
    }
}

/// Parse a persisted RFC 3339 `received_at`.
pub fn parse_received_at(raw: &str) -> Result<DateTime<Utc>, InvalidReportError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            InvalidReportError::MalformedPayload(format!("received_at {:?}: {}", raw, e))
        })
}

/// A submission that was refused, kept for the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSubmission {
    pub request_id: String,
    pub content_hash: String,
    pub rejection_reason: String,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_category_parsing() {
        assert_eq!("car".parse::<ImpactCategory>().unwrap(), ImpactCategory::CarBlocked);
        assert_eq!(
            "MOTORCYCLE_BLOCKED".parse::<ImpactCategory>().unwrap(),
            ImpactCategory::MotorcycleBlocked
        );
        assert_eq!(
            " walkable ".parse::<ImpactCategory>().unwrap(),
            ImpactCategory::Walkable
        );
        assert!(matches!(
            "boat".parse::<ImpactCategory>(),
            Err(InvalidReportError::UnrecognizedImpactCategory(c)) if c == "boat"
        ));
    }

    #[test]
    fn test_impact_category_serde_uses_wire_names() {
        let json = serde_json::to_string(&ImpactCategory::MotorcycleBlocked).unwrap();
        assert_eq!(json, r#""motorcycle""#);
        let back: ImpactCategory = serde_json::from_str(r#""car""#).unwrap();
        assert_eq!(back, ImpactCategory::CarBlocked);
    }

    #[test]
    fn test_row_conversion() {
        let received_at = Utc::now();
        let row = ReportRow {
            id: 7,
            is_flooded: true,
            depth_meters: None,
            impact_category: Some("car".to_string()),
            received_at,
        };

        let stored = StoredReport::try_from(row.clone()).unwrap();
        assert_eq!(stored.id, 7);
        assert_eq!(stored.report, Report::flooded_with_impact(ImpactCategory::CarBlocked));
        assert_eq!(ReportRow::from(&stored), row);
    }

    #[test]
    fn test_row_conversion_rejects_bad_rows() {
        let received_at = Utc::now();
        let both = ReportRow {
            id: 1,
            is_flooded: true,
            depth_meters: Some(0.4),
            impact_category: Some("car".to_string()),
            received_at,
        };
        assert!(StoredReport::try_from(both).is_err());

        let unknown = ReportRow {
            id: 2,
            is_flooded: true,
            depth_meters: None,
            impact_category: Some("boat".to_string()),
            received_at,
        };
        assert!(matches!(
            StoredReport::try_from(unknown),
            Err(InvalidReportError::UnrecognizedImpactCategory(_))
        ));

        let negative_id = ReportRow {
            id: -3,
            is_flooded: false,
            depth_meters: None,
            impact_category: None,
            received_at,
        };
        assert!(matches!(
            StoredReport::try_from(negative_id),
            Err(InvalidReportError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_parse_received_at() {
        let parsed = parse_received_at("2024-11-02T08:15:00+07:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-11-02T01:15:00+00:00");

        assert!(matches!(
            parse_received_at("yesterday"),
            Err(InvalidReportError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_column_values() {
        assert_eq!(
            Report::flooded_with_impact(ImpactCategory::CarBlocked).column_values(),
            (true, None, Some("car"))
        );
        assert_eq!(
            Report::flooded_with_depth(0.4).column_values(),
            (true, Some(0.4), None)
        );
        assert_eq!(Report::not_flooded().column_values(), (false, None, None));
    }
}
