//! Group-by with count, mean and sum reductions.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::select::ensure_field;
use crate::types::{Field, Measure, Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Rows in the group.
    Count,
    /// Mean over the group's non-null values; NaN when there are none.
    Mean(Measure),
    /// Sum over the group's non-null values.
    Sum(Measure),
}

impl Reduction {
    fn measure(self) -> Option<Measure> {
        match self {
            Reduction::Count => None,
            Reduction::Mean(m) | Reduction::Sum(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub reduction: Reduction,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub keys: Vec<Field>,
    pub aggregates: Vec<Aggregate>,
}

impl GroupSpec {
    pub fn by(keys: &[Field]) -> Self {
        GroupSpec {
            keys: keys.to_vec(),
            aggregates: Vec::new(),
        }
    }

    fn push(mut self, reduction: Reduction, name: &str) -> Self {
        self.aggregates.push(Aggregate {
            reduction,
            name: name.to_string(),
        });
        self
    }

    pub fn count(self, name: &str) -> Self {
        self.push(Reduction::Count, name)
    }

    pub fn mean(self, measure: Measure, name: &str) -> Self {
        self.push(Reduction::Mean(measure), name)
    }

    pub fn sum(self, measure: Measure, name: &str) -> Self {
        self.push(Reduction::Sum(measure), name)
    }

    fn validate<R: Record>(&self) -> Result<()> {
        if self.keys.is_empty() || self.keys.len() > 2 {
            return Err(Error::InvalidGrouping(format!(
                "expected 1 or 2 grouping columns, got {}",
                self.keys.len()
            )));
        }
        if self.aggregates.is_empty() {
            return Err(Error::InvalidGrouping("no reductions requested".to_string()));
        }
        for key in &self.keys {
            ensure_field::<R>(*key)?;
        }
        let mut names: Vec<&str> = self.keys.iter().map(|k| k.name()).collect();
        for agg in &self.aggregates {
            if let Some(m) = agg.reduction.measure() {
                if !R::MEASURES.contains(&m) {
                    return Err(Error::InvalidGrouping(format!("{m} is not available for this dataset")));
                }
            }
            if names.contains(&agg.name.as_str()) {
                return Err(Error::InvalidGrouping(format!("duplicate column name '{}'", agg.name)));
            }
            names.push(&agg.name);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub keys: Vec<Value>,
    pub metrics: Vec<f64>,
}

/// Grouped output: one row per distinct key combination. Never modified in
/// place; ranking builds a new table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    key_columns: Vec<String>,
    metric_columns: Vec<String>,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub(crate) fn from_parts(key_columns: Vec<String>, metric_columns: Vec<String>, rows: Vec<SummaryRow>) -> Self {
        SummaryTable {
            key_columns,
            metric_columns,
            rows,
        }
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn metric_columns(&self) -> &[String] {
        &self.metric_columns
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric_index(&self, name: &str) -> Result<usize> {
        self.metric_columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Sum of a metric column over all rows.
    pub fn total(&self, name: &str) -> Result<f64> {
        let idx = self.metric_index(name)?;
        Ok(self.rows.iter().map(|r| r.metrics[idx]).sum())
    }

    /// Look up the metrics of the row whose keys equal `keys`.
    pub fn find(&self, keys: &[Value]) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.keys == keys)
    }

    pub(crate) fn into_rows(self) -> (Vec<String>, Vec<String>, Vec<SummaryRow>) {
        (self.key_columns, self.metric_columns, self.rows)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    sum: f64,
    n: usize,
}

/// Group `rows` by `spec.keys` and compute each requested reduction.
///
/// Rows with a null value in any grouping column are left out entirely.
/// No other cleaning happens here: filter invalid measurements first.
/// Rows come out ordered by key ascending.
pub fn aggregate<R: Record>(rows: &[R], spec: &GroupSpec) -> Result<SummaryTable> {
    spec.validate::<R>()?;

    let mut groups: BTreeMap<Vec<Value>, (usize, Vec<Acc>)> = BTreeMap::new();
    'rows: for row in rows {
        let mut keys = Vec::with_capacity(spec.keys.len());
        for field in &spec.keys {
            match row.key(*field) {
                Some(v) => keys.push(v),
                None => continue 'rows,
            }
        }
        let entry = groups
            .entry(keys)
            .or_insert_with(|| (0, vec![Acc::default(); spec.aggregates.len()]));
        entry.0 += 1;
        for (acc, agg) in entry.1.iter_mut().zip(&spec.aggregates) {
            if let Some(v) = agg.reduction.measure().and_then(|m| row.measure(m)) {
                acc.sum += v;
                acc.n += 1;
            }
        }
    }

    let out = groups
        .into_iter()
        .map(|(keys, (count, accs))| SummaryRow {
            keys,
            metrics: spec
                .aggregates
                .iter()
                .zip(accs)
                .map(|(agg, acc)| match agg.reduction {
                    Reduction::Count => count as f64,
                    Reduction::Mean(_) if acc.n == 0 => f64::NAN,
                    Reduction::Mean(_) => acc.sum / acc.n as f64,
                    Reduction::Sum(_) => acc.sum,
                })
                .collect(),
        })
        .collect();

    Ok(SummaryTable::from_parts(
        spec.keys.iter().map(|k| k.name().to_string()).collect(),
        spec.aggregates.iter().map(|a| a.name.clone()).collect(),
        out,
    ))
}
