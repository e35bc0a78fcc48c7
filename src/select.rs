//! Selectable domains and conjunctive equality filters.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::{Field, NormalizedMission, Record, Value};

pub(crate) fn ensure_field<R: Record>(field: Field) -> Result<()> {
    if R::FIELDS.contains(&field) {
        Ok(())
    } else {
        Err(Error::UnsupportedField { field })
    }
}

/// Distinct non-null values of `field` in `rows`, ascending. This is the only
/// set of values a [`Selection`] accepts for that column.
pub fn domain<R: Record>(rows: &[R], field: Field) -> Result<Vec<Value>> {
    ensure_field::<R>(field)?;
    let values: BTreeSet<Value> = rows.iter().filter_map(|r| r.key(field)).collect();
    Ok(values.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: Field,
    pub value: Value,
}

/// A set of equality predicates, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    predicates: Vec<Predicate>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            field,
            value: value.into(),
        });
        self
    }

    /// Return the rows matching every predicate. Each predicate value must be
    /// in the current domain of its column.
    pub fn apply<R: Record + Clone>(&self, rows: &[R]) -> Result<Vec<R>> {
        for p in &self.predicates {
            let values = domain(rows, p.field)?;
            if values.binary_search(&p.value).is_err() {
                return Err(Error::InvalidSelection {
                    field: p.field,
                    value: p.value.clone(),
                });
            }
        }
        Ok(rows
            .iter()
            .filter(|r| {
                self.predicates
                    .iter()
                    .all(|p| r.key(p.field).as_ref() == Some(&p.value))
            })
            .cloned()
            .collect())
    }
}

/// Keep missions with a strictly positive response time. Must run before any
/// mean response time is taken; the aggregator does no cleaning itself.
pub fn with_valid_response_time(rows: &[NormalizedMission]) -> Vec<NormalizedMission> {
    rows.iter()
        .filter(|r| matches!(r.record.response_time, Some(t) if t > 0.0))
        .cloned()
        .collect()
}
