//! Per-session analysis configuration.
//!
//! The redistricting run is year-dependent: the block table carries one
//! `NewPop<year>` column per building-permit year joined upstream, and the
//! derived field names embed the two-digit analysis year. The session
//! record is discovered once from the schema and passed by reference into
//! every later step.

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::error::AnalysisError;
use crate::table::BlockTable;

/// Year-dependent field names for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    /// Two-digit analysis year, e.g. `"18"`.
    pub year: String,
    /// Derived total-population column, e.g. `"EstTotPop18"`.
    pub total_pop_field: String,
    /// Derived new-housing-units column, e.g. `"EstNewHU18"`.
    pub new_units_field: String,
    /// Year-stamped copy of the current ward column, e.g. `"ward18"`.
    pub ward_alias: String,
}

impl AnalysisSession {
    /// Discovers the analysis year from the table schema: the maximum year
    /// suffix among the permit-derived `NewPop<year>` columns.
    pub fn discover(table: &BlockTable) -> Result<Self, AnalysisError> {
        let pattern = Regex::new(r"^NewPop(\d{4})$").expect("valid pattern");

        let year = table
            .columns()
            .iter()
            .filter_map(|c| pattern.captures(c))
            .filter_map(|caps| caps[1].parse::<u16>().ok())
            .max()
            .ok_or_else(|| {
                AnalysisError::InsufficientData(
                    "no NewPop<year> columns to discover the analysis year from".to_string(),
                )
            })?;

        let yy = format!("{:02}", year % 100);
        let session = AnalysisSession {
            total_pop_field: format!("EstTotPop{yy}"),
            new_units_field: format!("EstNewHU{yy}"),
            ward_alias: format!("ward{yy}"),
            year: yy,
        };

        info!(
            year = %session.year,
            total_pop_field = %session.total_pop_field,
            new_units_field = %session.new_units_field,
            "Analysis session discovered"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_columns(header: &str) -> BlockTable {
        let csv = format!("{header}\n");
        BlockTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_discover_takes_max_permit_year() {
        let table = table_with_columns("GEOID10,EstTotPop14,NewPop2015,NewPop2016,NewPop2018");
        let session = AnalysisSession::discover(&table).unwrap();

        assert_eq!(session.year, "18");
        assert_eq!(session.total_pop_field, "EstTotPop18");
        assert_eq!(session.new_units_field, "EstNewHU18");
        assert_eq!(session.ward_alias, "ward18");
    }

    #[test]
    fn test_discover_ignores_partial_matches() {
        // Neither a bare NewPop nor a two-digit suffix qualifies
        let table = table_with_columns("GEOID10,NewPop,NewPop15,NewPopulation2016");
        assert!(matches!(
            AnalysisSession::discover(&table),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_discover_fails_without_permit_columns() {
        let table = table_with_columns("GEOID10,EstTotPop14,Ward_Numbe");
        assert!(matches!(
            AnalysisSession::discover(&table),
            Err(AnalysisError::InsufficientData(_))
        ));
    }
}
