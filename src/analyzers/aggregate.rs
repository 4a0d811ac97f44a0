//! Group-by aggregation over the block table.

use tracing::debug;

use crate::analyzers::types::Aggregates;
use crate::error::AnalysisError;
use crate::table::BlockTable;

/// Groups the table by a label column and sums the given value columns.
///
/// Rows whose label is absent are excluded entirely; they form no group.
/// Absent value cells count as zero. Group order is first-seen row order.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidColumn`] if the grouping column or any
/// value column is missing from the table schema.
pub fn aggregate(
    table: &BlockTable,
    group_by: &str,
    value_columns: &[&str],
) -> Result<Aggregates, AnalysisError> {
    let group_idx = table.column_index(group_by)?;
    let value_indices: Vec<(usize, &str)> = value_columns
        .iter()
        .map(|name| table.column_index(name).map(|idx| (idx, *name)))
        .collect::<Result<_, _>>()?;

    let mut result = Aggregates::default();
    let mut skipped = 0usize;

    for row in 0..table.len() {
        let Some(key) = table.cell(row, group_idx).label() else {
            skipped += 1;
            continue;
        };

        let group = result.entry(&key);
        group.rows += 1;
        for &(idx, name) in &value_indices {
            *group.sums.entry(name.to_string()).or_insert(0.0) += table.number(row, idx);
        }
    }

    debug!(
        group_by,
        groups = result.len(),
        skipped_null_rows = skipped,
        "Aggregated table"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
GEOID10,EstTotPop18,EstNewHU18,ward18,Name
b1,10,1,A,Riverfront
b2,20,2,A,Northside
b3,5,0,B,Northside
b4,7,3,,Riverfront
";

    fn sample_table() -> BlockTable {
        BlockTable::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_sums_by_group() {
        let table = sample_table();
        let aggs = aggregate(&table, "ward18", &["EstTotPop18"]).unwrap();

        assert_eq!(aggs.get("A").unwrap().sum("EstTotPop18"), 30.0);
        assert_eq!(aggs.get("B").unwrap().sum("EstTotPop18"), 5.0);
    }

    #[test]
    fn test_null_label_rows_form_no_group() {
        let table = sample_table();
        let aggs = aggregate(&table, "ward18", &["EstTotPop18"]).unwrap();

        assert_eq!(aggs.len(), 2);
        // b4's population is absent from every group
        let total: f64 = aggs.iter().map(|g| g.sum("EstTotPop18")).sum();
        assert_eq!(total, 35.0);
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let table = sample_table();
        let aggs = aggregate(&table, "Name", &["EstTotPop18"]).unwrap();

        let keys: Vec<&str> = aggs.keys().collect();
        assert_eq!(keys, vec!["Riverfront", "Northside"]);
    }

    #[test]
    fn test_multiple_value_columns() {
        let table = sample_table();
        let aggs = aggregate(&table, "ward18", &["EstNewHU18", "EstTotPop18"]).unwrap();

        let a = aggs.get("A").unwrap();
        assert_eq!(a.sum("EstNewHU18"), 3.0);
        assert_eq!(a.sum("EstTotPop18"), 30.0);
        assert_eq!(a.rows, 2);
    }

    #[test]
    fn test_invalid_group_column() {
        let table = sample_table();
        let err = aggregate(&table, "ward99", &["EstTotPop18"]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidColumn(c) if c == "ward99"));
    }

    #[test]
    fn test_invalid_value_column() {
        let table = sample_table();
        let err = aggregate(&table, "ward18", &["EstTotPop99"]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidColumn(c) if c == "EstTotPop99"));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let table = sample_table();
        let first = aggregate(&table, "ward18", &["EstTotPop18"]).unwrap();
        let second = aggregate(&table, "ward18", &["EstTotPop18"]).unwrap();

        let first_keys: Vec<&str> = first.keys().collect();
        let second_keys: Vec<&str> = second.keys().collect();
        assert_eq!(first_keys, second_keys);
        for key in first.keys() {
            assert_eq!(
                first.get(key).unwrap().sum("EstTotPop18"),
                second.get(key).unwrap().sum("EstTotPop18")
            );
        }
    }
}
