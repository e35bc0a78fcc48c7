//! Sorting and top-N truncation of summary tables.

use std::cmp::Ordering;

use crate::aggregate::SummaryTable;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSpec {
    pub column: String,
    pub direction: Direction,
    pub limit: Option<usize>,
}

impl RankSpec {
    pub fn ascending(column: &str) -> Self {
        RankSpec {
            column: column.to_string(),
            direction: Direction::Ascending,
            limit: None,
        }
    }

    pub fn descending(column: &str) -> Self {
        RankSpec {
            column: column.to_string(),
            direction: Direction::Descending,
            limit: None,
        }
    }

    pub fn top(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// NaN goes last whichever way the column is sorted.
fn compare(a: f64, b: f64, direction: Direction) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        }
    }
}

/// Return a new table sorted by `spec.column` and cut to `spec.limit` rows.
/// The sort is stable, so ties keep their previous order. A limit larger than
/// the table returns every row.
pub fn rank(table: &SummaryTable, spec: &RankSpec) -> Result<SummaryTable> {
    let idx = table.metric_index(&spec.column)?;
    let (keys, metrics, mut rows) = table.clone().into_rows();
    rows.sort_by(|a, b| compare(a.metrics[idx], b.metrics[idx], spec.direction));
    if let Some(n) = spec.limit {
        rows.truncate(n);
    }
    Ok(SummaryTable::from_parts(keys, metrics, rows))
}
