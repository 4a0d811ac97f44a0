//! Assembles the exportable summary tables.

use chrono::Utc;

use crate::analyzers::types::{Aggregates, BalanceTarget, NamedTable, ReportBundle, ScenarioReport};
use crate::session::AnalysisSession;

/// Renders an integral sum without a trailing fraction.
fn fmt_sum(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Renders a per-group aggregate as a named table, one row per group label,
/// sorted by label for display.
pub fn aggregate_table(
    name: &str,
    key_header: &str,
    value_columns: &[&str],
    aggregates: &Aggregates,
) -> NamedTable {
    let mut headers = vec![key_header.to_string()];
    headers.extend(value_columns.iter().map(|c| c.to_string()));

    let mut rows: Vec<Vec<String>> = aggregates
        .iter()
        .map(|group| {
            let mut row = vec![group.key.clone()];
            row.extend(value_columns.iter().map(|c| fmt_sum(group.sum(c))));
            row
        })
        .collect();
    rows.sort_by(|a, b| a[0].cmp(&b[0]));

    NamedTable {
        name: name.to_string(),
        headers,
        rows,
    }
}

/// Renders the single-row metrics sheet. The total-population header embeds
/// the two-digit analysis year so archived workbooks stay distinguishable.
pub fn metrics_table(target: &BalanceTarget, session: &AnalysisSession) -> NamedTable {
    NamedTable {
        name: "metrics".to_string(),
        headers: vec![
            format!("Total Population '{}", session.year),
            "Ward Avg".to_string(),
            "+/- 3%".to_string(),
            "Min".to_string(),
            "Max".to_string(),
        ],
        rows: vec![vec![
            target.total_population.to_string(),
            target.average.to_string(),
            target.tolerance.to_string(),
            target.band.min.to_string(),
            target.band.max.to_string(),
        ]],
    }
}

/// Renders a scenario comparison as a named table, sorted by ward label.
pub fn scenario_table(report: &ScenarioReport) -> NamedTable {
    let mut rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            vec![
                row.ward.clone(),
                row.current.to_string(),
                row.candidate.to_string(),
                row.change.to_string(),
                row.from_average.to_string(),
                row.percent.clone(),
            ]
        })
        .collect();
    rows.sort_by(|a, b| a[0].cmp(&b[0]));

    NamedTable {
        name: report.scenario.clone(),
        headers: vec![
            "Ward".to_string(),
            "Current Est".to_string(),
            "Scenario Pop".to_string(),
            "Change".to_string(),
            "+/- from Avg".to_string(),
            "% Avg".to_string(),
        ],
        rows,
    }
}

/// Bundles the ward aggregate, neighborhood-council aggregate, and metrics
/// summary into the exportable report. Does not write anything; export is a
/// separate step.
pub fn build_report(
    by_ward: &Aggregates,
    by_nc: &Aggregates,
    target: &BalanceTarget,
    session: &AnalysisSession,
    nc_column: &str,
) -> ReportBundle {
    let value_columns = [
        session.new_units_field.as_str(),
        session.total_pop_field.as_str(),
    ];

    ReportBundle {
        generated_at: Utc::now(),
        by_nc: aggregate_table("by_NC", nc_column, &value_columns, by_nc),
        by_ward: aggregate_table("by_ward", &session.ward_alias, &value_columns, by_ward),
        metrics: metrics_table(target, session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::analyzers::balance::compute_balance;
    use crate::table::BlockTable;

    const CSV: &str = "\
GEOID10,EstTotPop18,EstNewHU18,ward18,Name
b1,12100,4,2,Riverfront
b2,12300,1,1,Northside
b3,12250,0,3,Northside
";

    fn session() -> AnalysisSession {
        AnalysisSession {
            year: "18".to_string(),
            total_pop_field: "EstTotPop18".to_string(),
            new_units_field: "EstNewHU18".to_string(),
            ward_alias: "ward18".to_string(),
        }
    }

    fn bundle() -> ReportBundle {
        let table = BlockTable::from_reader(CSV.as_bytes()).unwrap();
        let value_columns = ["EstNewHU18", "EstTotPop18"];
        let by_ward = aggregate(&table, "ward18", &value_columns).unwrap();
        let by_nc = aggregate(&table, "Name", &value_columns).unwrap();
        let target = compute_balance(&by_ward, "EstTotPop18").unwrap();
        build_report(&by_ward, &by_nc, &target, &session(), "Name")
    }

    #[test]
    fn test_metrics_header_embeds_year() {
        let bundle = bundle();
        assert_eq!(bundle.metrics.headers[0], "Total Population '18");
        assert_eq!(bundle.metrics.rows.len(), 1);
    }

    #[test]
    fn test_metrics_row_matches_target() {
        let bundle = bundle();
        // 36650 over 3 wards: average 12217, tolerance 367
        assert_eq!(
            bundle.metrics.rows[0],
            vec!["36650", "12217", "367", "11850", "12584"]
        );
    }

    #[test]
    fn test_ward_table_is_sorted_for_display() {
        let bundle = bundle();
        let wards: Vec<&str> = bundle.by_ward.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(wards, vec!["1", "2", "3"]);
        assert_eq!(bundle.by_ward.headers, vec!["ward18", "EstNewHU18", "EstTotPop18"]);
    }

    #[test]
    fn test_nc_table_groups_both_value_columns() {
        let bundle = bundle();
        let northside = bundle
            .by_nc
            .rows
            .iter()
            .find(|r| r[0] == "Northside")
            .unwrap();
        assert_eq!(northside[1], "1"); // new units
        assert_eq!(northside[2], "24550"); // population
    }

    #[test]
    fn test_scenario_table_layout() {
        use crate::analyzers::types::{ScenarioReport, ScenarioRow};

        let report = ScenarioReport {
            scenario: "plan_a".to_string(),
            rows: vec![ScenarioRow {
                ward: "1".to_string(),
                current: 30,
                candidate: 10,
                change: -20,
                from_average: -40,
                percent: "-80.00%".to_string(),
            }],
        };
        let table = scenario_table(&report);

        assert_eq!(table.name, "plan_a");
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.rows[0], vec!["1", "30", "10", "-20", "-40", "-80.00%"]);
    }
}
