//! Balance target derivation from the current ward aggregates.

use tracing::info;

use crate::analyzers::types::{Aggregates, BalanceBand, BalanceTarget};
use crate::error::AnalysisError;

/// Allowed fraction deviation from the ward average.
const TOLERANCE_FRACTION: f64 = 0.03;

/// Derives the balancing target from per-ward population aggregates.
///
/// The average rounds up: with a ceiling target every ward is pushed toward
/// receiving at least the average rather than just under it. The band ends
/// apply floor and ceiling independently; keep that shape even though both
/// operands are integral by the time they are combined.
///
/// # Errors
///
/// Returns [`AnalysisError::InsufficientData`] when no ward carries a
/// non-null label, and [`AnalysisError::InvalidColumn`] when the population
/// column was not part of the aggregation.
pub fn compute_balance(
    ward_aggregates: &Aggregates,
    population_column: &str,
) -> Result<BalanceTarget, AnalysisError> {
    if ward_aggregates.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "no wards with a non-null label to balance".to_string(),
        ));
    }
    if !ward_aggregates
        .iter()
        .any(|group| group.sums.contains_key(population_column))
    {
        return Err(AnalysisError::InvalidColumn(population_column.to_string()));
    }

    let total: f64 = ward_aggregates
        .iter()
        .map(|group| group.sum(population_column))
        .sum();
    let ward_count = ward_aggregates.len();

    let average = (total / ward_count as f64).ceil();
    let tolerance = (TOLERANCE_FRACTION * average).ceil();
    let band = BalanceBand {
        min: (average - tolerance).floor() as i64,
        max: (average + tolerance).ceil() as i64,
    };

    let target = BalanceTarget {
        total_population: total as i64,
        ward_count,
        average: average as i64,
        tolerance: tolerance as i64,
        band,
    };

    info!(
        total_population = target.total_population,
        ward_count = target.ward_count,
        average = target.average,
        tolerance = target.tolerance,
        band_min = target.band.min,
        band_max = target.band.max,
        "Balance target computed"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::table::BlockTable;

    const POP: &str = "EstTotPop18";

    fn aggregates_for(pops: &[(&str, f64)]) -> Aggregates {
        let mut csv = format!("GEOID10,{POP},ward18\n");
        for (i, (ward, pop)) in pops.iter().enumerate() {
            csv.push_str(&format!("b{i},{pop},{ward}\n"));
        }
        let table = BlockTable::from_reader(csv.as_bytes()).unwrap();
        aggregate(&table, "ward18", &[POP]).unwrap()
    }

    #[test]
    fn test_six_ward_example() {
        // 73120 total over six wards
        let aggs = aggregates_for(&[
            ("1", 12100.0),
            ("2", 12300.0),
            ("3", 12250.0),
            ("4", 12070.0),
            ("5", 12200.0),
            ("6", 12200.0),
        ]);
        let target = compute_balance(&aggs, POP).unwrap();

        assert_eq!(target.total_population, 73120);
        assert_eq!(target.ward_count, 6);
        assert_eq!(target.average, 12187);
        assert_eq!(target.tolerance, 366);
        assert_eq!(target.band, BalanceBand { min: 11821, max: 12553 });
    }

    #[test]
    fn test_average_rounds_up() {
        let aggs = aggregates_for(&[("1", 5.0), ("2", 5.0), ("3", 1.0)]);
        let target = compute_balance(&aggs, POP).unwrap();

        // 11 / 3 rounds up to 4
        assert_eq!(target.average, 4);
    }

    #[test]
    fn test_average_within_ward_count_of_total() {
        let aggs = aggregates_for(&[("1", 101.0), ("2", 205.0), ("3", 399.0), ("4", 57.0)]);
        let target = compute_balance(&aggs, POP).unwrap();

        let spread = target.average * target.ward_count as i64 - target.total_population;
        assert!(spread >= 0);
        assert!(spread < target.ward_count as i64);
    }

    #[test]
    fn test_band_contains_average() {
        let aggs = aggregates_for(&[("1", 7.0), ("2", 13.0), ("3", 29.0)]);
        let target = compute_balance(&aggs, POP).unwrap();

        assert!(target.band.min <= target.average);
        assert!(target.average <= target.band.max);
    }

    #[test]
    fn test_no_wards_is_an_error() {
        let aggs = aggregates_for(&[]);
        assert!(matches!(
            compute_balance(&aggs, POP),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_wrong_population_column_is_an_error() {
        let aggs = aggregates_for(&[("1", 10.0)]);
        assert!(matches!(
            compute_balance(&aggs, "EstTotPop99"),
            Err(AnalysisError::InvalidColumn(c)) if c == "EstTotPop99"
        ));
    }
}
