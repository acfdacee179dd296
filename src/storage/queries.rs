//! SQL query builders.
//!
//! Generates SQL for the `reports` table.
//! Actual execution is handled by the storage collaborator (Python/psycopg).

use crate::config::ConsensusVariant;

/// Name of the reports table.
pub const REPORTS_TABLE: &str = "reports";

/// Column holding the variant-specific reading, with its SQL type.
pub fn reading_column(variant: ConsensusVariant) -> (&'static str, &'static str) {
    match variant {
        ConsensusVariant::Depth => ("depth_meters", "DOUBLE PRECISION CHECK (depth_meters >= 0)"),
        ConsensusVariant::Impact => (
            "impact_category",
            "TEXT CHECK (impact_category IN ('walkable', 'motorcycle', 'car'))",
        ),
    }
}

/// Build CREATE TABLE for the reports table.
pub fn build_reports_table_ddl(variant: ConsensusVariant) -> String {
    let (column, sql_type) = reading_column(variant);
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    \
         id BIGSERIAL PRIMARY KEY,\n    \
         is_flooded BOOLEAN NOT NULL,\n    \
         {column} {sql_type},\n    \
         received_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP\n)",
        table = REPORTS_TABLE,
    )
}

/// Build INSERT for one report. Parameters: `$1` is_flooded, `$2` reading.
pub fn build_report_insert(variant: ConsensusVariant) -> String {
    let (column, _) = reading_column(variant);
    format!(
        "INSERT INTO {} (is_flooded, {}) VALUES ($1, $2) RETURNING id, received_at",
        REPORTS_TABLE, column
    )
}

/// Build SELECT for the full collection in insertion order.
pub fn build_reports_select(variant: ConsensusVariant) -> String {
    let (column, _) = reading_column(variant);
    format!(
        "SELECT id, is_flooded, {}, received_at FROM {} ORDER BY id",
        column, REPORTS_TABLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_per_variant() {
        let ddl = build_reports_table_ddl(ConsensusVariant::Depth);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS reports"));
        assert!(ddl.contains("depth_meters DOUBLE PRECISION"));
        assert!(!ddl.contains("impact_category"));

        let ddl = build_reports_table_ddl(ConsensusVariant::Impact);
        assert!(ddl.contains("impact_category TEXT"));
        assert!(!ddl.contains("depth_meters"));
        assert!(ddl.contains("received_at TIMESTAMPTZ"));
    }

    #[test]
    fn test_insert_query() {
        let query = build_report_insert(ConsensusVariant::Impact);
        assert_eq!(
            query,
            "INSERT INTO reports (is_flooded, impact_category) VALUES ($1, $2) RETURNING id, received_at"
        );
    }

    #[test]
    fn test_select_is_ordered_by_id() {
        let query = build_reports_select(ConsensusVariant::Depth);
        assert!(query.contains("depth_meters"));
        assert!(query.ends_with("ORDER BY id"));
    }
}
