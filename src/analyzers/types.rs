//! Result types produced by the balancing pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summed value columns for one group label.
#[derive(Debug, Clone, Serialize)]
pub struct GroupTotals {
    pub key: String,
    pub sums: HashMap<String, f64>,
    pub rows: usize,
}

impl GroupTotals {
    /// Sum for one value column; zero if the column was not aggregated.
    pub fn sum(&self, column: &str) -> f64 {
        self.sums.get(column).copied().unwrap_or(0.0)
    }
}

/// Per-group aggregation result, in first-seen key order. Never sorted
/// internally; callers sort for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregates {
    groups: Vec<GroupTotals>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Aggregates {
    pub(crate) fn entry(&mut self, key: &str) -> &mut GroupTotals {
        if let Some(&idx) = self.index.get(key) {
            return &mut self.groups[idx];
        }
        self.index.insert(key.to_string(), self.groups.len());
        self.groups.push(GroupTotals {
            key: key.to_string(),
            sums: HashMap::new(),
            rows: 0,
        });
        self.groups.last_mut().expect("just pushed")
    }

    pub fn get(&self, key: &str) -> Option<&GroupTotals> {
        self.index.get(key).map(|&idx| &self.groups[idx])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupTotals> {
        self.groups.iter()
    }

    /// Number of distinct group labels.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Acceptable population range around the target average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceBand {
    pub min: i64,
    pub max: i64,
}

/// The balancing target derived from the current ward assignment.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceTarget {
    pub total_population: i64,
    pub ward_count: usize,
    /// Ceiling of total over ward count. Rounding up biases each ward
    /// toward receiving at least the average.
    pub average: i64,
    /// Ceiling of 3% of the average.
    pub tolerance: i64,
    pub band: BalanceBand,
}

/// One ward's line in a scenario comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRow {
    pub ward: String,
    pub current: i64,
    pub candidate: i64,
    pub change: i64,
    pub from_average: i64,
    /// Percent deviation from the average, e.g. `"-95.90%"`.
    pub percent: String,
}

/// Comparison of one candidate assignment against the current one. A fresh
/// report is produced per comparison; it is never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub rows: Vec<ScenarioRow>,
}

/// A plain row/column table ready for tabular export, one workbook sheet.
#[derive(Debug, Clone, Serialize)]
pub struct NamedTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The assembled summary: per-neighborhood and per-ward aggregates plus the
/// single-row metrics sheet.
#[derive(Debug, Serialize)]
pub struct ReportBundle {
    pub generated_at: DateTime<Utc>,
    pub by_nc: NamedTable,
    pub by_ward: NamedTable,
    pub metrics: NamedTable,
}
