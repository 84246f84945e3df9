use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::binner::BinnedDataset;
use super::model::{resolve_column, Attribute, Dataset, Value};
use crate::error::{EngineError, EngineResult};

/// One line of a summary table: a category and the outcome statistics of the
/// records that fall into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub category: String,
    pub count: usize,
    /// Mean of the outcome attribute over the category.
    pub mean: f64,
    /// `mean * 100`.
    pub churn_rate: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    count: usize,
    sum: f64,
}

impl Tally {
    fn add(&mut self, outcome: f64) {
        self.count += 1;
        self.sum += outcome;
    }

    fn into_row(self, category: String) -> Option<AggregationRow> {
        if self.count == 0 {
            return None;
        }
        let mean = self.sum / self.count as f64;
        Some(AggregationRow {
            category,
            count: self.count,
            mean,
            churn_rate: mean * 100.0,
        })
    }
}

fn outcome_attribute(columns: &[Attribute], outcome: &str) -> EngineResult<Attribute> {
    let attr = resolve_column(columns, outcome)?;
    if !attr.is_numeric() {
        return Err(EngineError::invalid_spec(format!(
            "outcome attribute '{attr}' is not numeric"
        )));
    }
    Ok(attr)
}

/// Group `dataset` by the raw values of `category` and summarise `outcome`
/// per group.
///
/// Groups are emitted in the order their category is first seen. Records
/// with a null category or a null outcome are left out of every group, and a
/// group left with no records is omitted rather than emitted with an
/// undefined mean.
pub fn aggregate(
    dataset: &Dataset,
    category: &str,
    outcome: &str,
) -> EngineResult<Vec<AggregationRow>> {
    let category_attr = dataset.resolve(category)?;
    let outcome_attr = outcome_attribute(dataset.columns(), outcome)?;

    let mut order: Vec<(Value, Tally)> = Vec::new();
    let mut index: HashMap<Value, usize> = HashMap::new();

    for record in dataset.records() {
        let key = record.value(category_attr);
        if key.is_null() {
            continue;
        }
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            order.push((key, Tally::default()));
            order.len() - 1
        });
        if let Some(v) = record.numeric(outcome_attr) {
            order[slot].1.add(v);
        }
    }

    Ok(collect_rows(
        order.into_iter().map(|(key, tally)| (key.to_string(), tally)),
        category_attr.name(),
    ))
}

/// Summarise `outcome` per category of a binned dataset, in label
/// declaration order.
pub fn aggregate_binned(
    binned: &BinnedDataset,
    outcome: &str,
) -> EngineResult<Vec<AggregationRow>> {
    let outcome_attr = outcome_attribute(binned.columns(), outcome)?;

    let mut tallies = vec![Tally::default(); binned.labels().len()];
    for row in binned.rows() {
        if let Some(v) = row.record.numeric(outcome_attr) {
            tallies[row.bin].add(v);
        }
    }

    Ok(collect_rows(
        binned.labels().iter().cloned().zip(tallies),
        binned.attribute().name(),
    ))
}

fn collect_rows(
    groups: impl Iterator<Item = (String, Tally)>,
    category: &str,
) -> Vec<AggregationRow> {
    let mut omitted = 0usize;
    let rows: Vec<AggregationRow> = groups
        .filter_map(|(label, tally)| {
            let row = tally.into_row(label);
            if row.is_none() {
                omitted += 1;
            }
            row
        })
        .collect();
    if omitted > 0 {
        debug!("aggregate: omitted {omitted} empty '{category}' group(s)");
    }
    rows
}

/// Replace raw category values with display labels, e.g. `0`/`1` with
/// "Inactive"/"Active". Categories without a mapping keep their raw label.
pub fn relabel(rows: Vec<AggregationRow>, labels: &[(&str, &str)]) -> Vec<AggregationRow> {
    rows.into_iter()
        .map(|mut row| {
            if let Some((_, label)) = labels.iter().find(|(raw, _)| *raw == row.category) {
                row.category = (*label).to_string();
            }
            row
        })
        .collect()
}
