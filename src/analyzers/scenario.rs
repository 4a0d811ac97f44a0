//! Scenario comparison: a candidate ward assignment against the current one.

use tracing::debug;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::types::{BalanceTarget, ScenarioReport, ScenarioRow};
use crate::error::AnalysisError;
use crate::table::BlockTable;

/// Compares a candidate assignment column against the current assignment.
///
/// Both columns are aggregated independently and the report covers the
/// union of their ward labels: a ward present on only one side still gets a
/// line, with the missing side counted as zero population. Current-side
/// wards come first in their aggregation order, then candidate-only wards.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidColumn`] for missing columns and
/// [`AnalysisError::DivisionByZero`] when the balance average is zero. The
/// zero guard stays even though `compute_balance` cannot produce a zero
/// average from real counts, since callers may construct targets
/// independently.
pub fn compare(
    table: &BlockTable,
    current_column: &str,
    scenario_column: &str,
    population_column: &str,
    target: &BalanceTarget,
) -> Result<ScenarioReport, AnalysisError> {
    if target.average == 0 {
        return Err(AnalysisError::DivisionByZero);
    }

    let current = aggregate(table, current_column, &[population_column])?;
    let candidate = aggregate(table, scenario_column, &[population_column])?;

    let mut wards: Vec<String> = current.keys().map(str::to_string).collect();
    wards.extend(
        candidate
            .keys()
            .filter(|key| current.get(key).is_none())
            .map(str::to_string),
    );

    let average = target.average;
    let rows = wards
        .into_iter()
        .map(|ward| {
            let current_pop = current
                .get(&ward)
                .map(|g| g.sum(population_column))
                .unwrap_or(0.0)
                .round() as i64;
            let candidate_pop = candidate
                .get(&ward)
                .map(|g| g.sum(population_column))
                .unwrap_or(0.0)
                .round() as i64;

            let from_average = candidate_pop - average;
            let percent = format!("{:.2}%", from_average as f64 / average as f64 * 100.0);

            ScenarioRow {
                ward,
                current: current_pop,
                candidate: candidate_pop,
                change: candidate_pop - current_pop,
                from_average,
                percent,
            }
        })
        .collect();

    debug!(scenario = scenario_column, "Scenario compared");
    Ok(ScenarioReport {
        scenario: scenario_column.to_string(),
        rows,
    })
}
