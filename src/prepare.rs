//! Table preparation: the pass that runs strictly before the analyzers.
//!
//! Mirrors the manual field work an analyst performs on the joined block
//! layer: fill NULL growth values to zero, derive the year-stamped total
//! population and new-housing-unit columns, and stamp the current ward
//! assignment with the analysis year. The analyzers never mutate the table;
//! everything destructive happens here.

use regex::Regex;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::session::AnalysisSession;
use crate::table::{BlockTable, Cell};

/// Growth columns whose NULLs mean zero, not unknown.
const GROWTH_COLUMNS: &str = r"dwellings|NewPop|TotPop|NewHU";

/// Runs the full preparation pass for one session.
pub fn prepare(
    table: &mut BlockTable,
    session: &AnalysisSession,
    current_ward_column: &str,
) -> Result<(), AnalysisError> {
    fill_growth_nulls(table);
    derive_total_population(table, session)?;
    derive_new_units(table, session);
    alias_ward_column(table, session, current_ward_column)?;
    Ok(())
}

/// Replaces NULL cells with zero in every growth column.
pub fn fill_growth_nulls(table: &mut BlockTable) {
    let pattern = Regex::new(GROWTH_COLUMNS).expect("valid pattern");
    let targets: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| pattern.is_match(name))
        .map(|(idx, _)| idx)
        .collect();

    let mut filled = 0usize;
    for row in 0..table.len() {
        for &col in &targets {
            if table.cell(row, col).is_null() {
                table.set_cell(row, col, Cell::Number(0.0));
                filled += 1;
            }
        }
    }
    info!(columns = targets.len(), filled, "Filled NULL growth values");
}

/// Derives the session's total-population column: the base-year estimate
/// plus every per-year population increment.
///
/// The base column is the lowest-year `EstTotPop<yy>` present, so re-running
/// after a previous derivation still starts from the original base.
pub fn derive_total_population(
    table: &mut BlockTable,
    session: &AnalysisSession,
) -> Result<(), AnalysisError> {
    let base_pattern = Regex::new(r"^EstTotPop(\d{2})$").expect("valid pattern");
    let base = table
        .columns()
        .iter()
        .filter(|name| **name != session.total_pop_field)
        .filter_map(|name| {
            base_pattern
                .captures(name)
                .and_then(|caps| caps[1].parse::<u16>().ok())
                .map(|year| (year, name.clone()))
        })
        .min_by_key(|(year, _)| *year)
        .map(|(_, name)| name)
        .ok_or_else(|| {
            AnalysisError::InsufficientData(
                "no base-year EstTotPop<yy> column to derive totals from".to_string(),
            )
        })?;

    let base_idx = table.column_index(&base)?;
    let newpop_pattern = Regex::new(r"^NewPop(\d{4})$").expect("valid pattern");
    let increments: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| newpop_pattern.is_match(name))
        .map(|(idx, _)| idx)
        .collect();

    let totals: Vec<Cell> = (0..table.len())
        .map(|row| {
            let sum: f64 = increments.iter().map(|&col| table.number(row, col)).sum();
            Cell::Number(table.number(row, base_idx) + sum)
        })
        .collect();

    info!(
        base = %base,
        increments = increments.len(),
        field = %session.total_pop_field,
        "Derived total population"
    );
    table.set_column(&session.total_pop_field, totals);
    Ok(())
}

/// Derives the session's new-housing-units column as the sum of every
/// dwelling-delta column (`dwellings`, `dwellings_1`, ...).
pub fn derive_new_units(table: &mut BlockTable, session: &AnalysisSession) {
    let pattern = Regex::new(r"^dwellings").expect("valid pattern");
    let sources: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| pattern.is_match(name))
        .map(|(idx, _)| idx)
        .collect();

    let units: Vec<Cell> = (0..table.len())
        .map(|row| Cell::Number(sources.iter().map(|&col| table.number(row, col)).sum()))
        .collect();

    info!(sources = sources.len(), field = %session.new_units_field, "Derived new units");
    table.set_column(&session.new_units_field, units);
}

/// Copies the current ward column to its year-stamped alias. Rows without
/// an assignment (de-annexed areas) stay NULL.
pub fn alias_ward_column(
    table: &mut BlockTable,
    session: &AnalysisSession,
    current_ward_column: &str,
) -> Result<(), AnalysisError> {
    let src = table.column_index(current_ward_column)?;
    let cells: Vec<Cell> = (0..table.len()).map(|row| table.cell(row, src).clone()).collect();
    table.set_column(&session.ward_alias, cells);
    Ok(())
}

/// Compares the prepared total population against a known floor, typically
/// the previous analysis total. A lower figure usually means a bad edit or
/// a dropped join, so it is logged loudly but does not halt the run.
pub fn verify_total(
    table: &BlockTable,
    session: &AnalysisSession,
    minimum: f64,
) -> Result<bool, AnalysisError> {
    let col = table.column_index(&session.total_pop_field)?;
    let total: f64 = (0..table.len()).map(|row| table.number(row, col)).sum();

    if total < minimum {
        warn!(total, minimum, "Total population lower than the configured floor");
        return Ok(false);
    }
    Ok(true)
}
