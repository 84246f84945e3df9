//! Bucketing of numeric attributes into ordered, labeled categories.
//!
//! Intervals are right-inclusive, `(lo, hi]`, except the lowest one which is
//! closed on both ends, `[lo, hi]`. A value equal to the lowest boundary is
//! therefore kept.
//!
//! Records whose value is null or falls outside every explicit interval get no
//! category and are **dropped** from the binned result. This is intentional:
//! such records cannot contribute to any category's statistics. The number of
//! dropped records is reported by [`BinnedDataset::dropped`].

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Attribute, CustomerRecord, Dataset};
use crate::error::{EngineError, EngineResult};

/// How to cut an attribute into categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSpec {
    /// `edges.len() - 1` intervals, one label each.
    Edges { edges: Vec<f64>, labels: Vec<String> },
    /// `bins` equal-width intervals spanning the observed min/max.
    EqualWidth {
        bins: usize,
        #[serde(default)]
        labels: Option<Vec<String>>,
    },
}

impl BinSpec {
    /// Explicit boundaries with one label per interval.
    pub fn edges<L: Into<String>>(
        edges: impl Into<Vec<f64>>,
        labels: impl IntoIterator<Item = L>,
    ) -> EngineResult<Self> {
        let spec = BinSpec::Edges {
            edges: edges.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// `bins` equal-width intervals with generated interval labels.
    pub fn equal_width(bins: usize) -> EngineResult<Self> {
        let spec = BinSpec::EqualWidth { bins, labels: None };
        spec.validate()?;
        Ok(spec)
    }

    /// `bins` equal-width intervals with caller-supplied labels.
    pub fn equal_width_labeled<L: Into<String>>(
        bins: usize,
        labels: impl IntoIterator<Item = L>,
    ) -> EngineResult<Self> {
        let spec = BinSpec::EqualWidth {
            bins,
            labels: Some(labels.into_iter().map(Into::into).collect()),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> EngineResult<()> {
        match self {
            BinSpec::Edges { edges, labels } => {
                if edges.len() < 2 {
                    return Err(EngineError::invalid_spec(
                        "at least two bin boundaries are required",
                    ));
                }
                if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
                    return Err(EngineError::invalid_spec(format!(
                        "bin boundary {bad} is not finite"
                    )));
                }
                if edges.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(EngineError::invalid_spec(format!(
                        "bin boundaries {edges:?} are not strictly increasing"
                    )));
                }
                check_labels(labels, edges.len() - 1)
            }
            BinSpec::EqualWidth { bins, labels } => {
                if *bins == 0 {
                    return Err(EngineError::invalid_spec("bin count must be at least 1"));
                }
                match labels {
                    Some(labels) => check_labels(labels, *bins),
                    None => Ok(()),
                }
            }
        }
    }
}

fn check_labels(labels: &[String], intervals: usize) -> EngineResult<()> {
    if labels.len() != intervals {
        return Err(EngineError::invalid_spec(format!(
            "{} label(s) given for {intervals} interval(s)",
            labels.len()
        )));
    }
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].contains(label) {
            return Err(EngineError::invalid_spec(format!(
                "duplicate bin label '{label}'"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Binned output
// ---------------------------------------------------------------------------

/// A record together with the index of the label it was assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedRecord {
    pub record: CustomerRecord,
    pub bin: usize,
}

impl BinnedRecord {
    pub fn label<'a>(&self, binned: &'a BinnedDataset) -> &'a str {
        &binned.labels[self.bin]
    }
}

/// The result of [`bin`]: the records that received a category, in input
/// order, plus the declared label order.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedDataset {
    attribute: Attribute,
    columns: Vec<Attribute>,
    labels: Vec<String>,
    edges: Vec<f64>,
    rows: Vec<BinnedRecord>,
    dropped: usize,
}

impl BinnedDataset {
    /// The attribute that was binned.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Labels in declaration order. Empty when the input had nothing to bin
    /// and the labels would have been generated.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Interval boundaries actually used.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn rows(&self) -> &[BinnedRecord] {
        &self.rows
    }

    /// Schema columns of the source dataset.
    pub fn columns(&self) -> &[Attribute] {
        &self.columns
    }

    /// Records left out because their value was null or outside every interval.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of records per label, in label order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        let mut counts = vec![0usize; self.labels.len()];
        for row in &self.rows {
            counts[row.bin] += 1;
        }
        self.labels
            .iter()
            .map(String::as_str)
            .zip(counts)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Index of the interval containing `value`, if any.
fn locate(edges: &[f64], value: f64) -> Option<usize> {
    // First boundary >= value.
    let idx = edges.partition_point(|&e| e < value);
    match idx {
        0 => (value == edges[0]).then_some(0),
        i if i == edges.len() => None,
        i => Some(i - 1),
    }
}

/// `bins + 1` evenly spaced edges over `[min, max]`. A zero-width span is
/// widened by 0.1% of `|min|` (or 0.001 when `min` is zero) on each side.
fn equal_width_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    let (lo, hi) = if min == max {
        let adjust = if min == 0.0 { 0.001 } else { min.abs() * 0.001 };
        (min - adjust, max + adjust)
    } else {
        (min, max)
    };
    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + step * i as f64).collect();
    // Pin the top edge so float error cannot push the maximum out of range.
    edges[bins] = hi;
    edges
}

fn interval_labels(edges: &[f64]) -> Vec<String> {
    edges
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let open = if i == 0 { '[' } else { '(' };
            format!("{open}{:.2}, {:.2}]", w[0], w[1])
        })
        .collect()
}

/// Assign every record of `dataset` a category of `attribute` according to
/// `spec`.
///
/// Fails with `SchemaMismatch` if the attribute is not in the dataset, and
/// with `InvalidSpec` for a malformed spec or a categorical attribute. An
/// empty dataset, or one where the attribute is entirely null, yields an
/// empty result.
pub fn bin(dataset: &Dataset, attribute: &str, spec: &BinSpec) -> EngineResult<BinnedDataset> {
    let attr = dataset.resolve(attribute)?;
    spec.validate()?;
    if !attr.is_numeric() {
        return Err(EngineError::invalid_spec(format!(
            "cannot bin categorical attribute '{attr}'"
        )));
    }

    let empty = |labels: Vec<String>, edges: Vec<f64>| BinnedDataset {
        attribute: attr,
        columns: dataset.columns().to_vec(),
        labels,
        edges,
        rows: Vec::new(),
        dropped: dataset.len(),
    };

    let (edges, labels) = match spec {
        BinSpec::Edges { edges, labels } => (edges.clone(), labels.clone()),
        BinSpec::EqualWidth { bins, labels } => match dataset.numeric_range(attr) {
            Some((min, max)) => {
                let edges = equal_width_edges(min, max, *bins);
                let labels = labels.clone().unwrap_or_else(|| interval_labels(&edges));
                (edges, labels)
            }
            None => {
                debug!("bin: '{attr}' has no values, nothing to bin");
                return Ok(empty(labels.clone().unwrap_or_default(), Vec::new()));
            }
        },
    };

    let mut rows = Vec::with_capacity(dataset.len());
    let mut dropped = 0usize;
    for record in dataset.records() {
        match record.numeric(attr).and_then(|v| locate(&edges, v)) {
            Some(bin) => rows.push(BinnedRecord {
                record: record.clone(),
                bin,
            }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("bin: dropped {dropped} record(s) with no '{attr}' category");
    }

    Ok(BinnedDataset {
        attribute: attr,
        columns: dataset.columns().to_vec(),
        labels,
        edges,
        rows,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(values: &[f64]) -> Dataset {
        Dataset::new(
            values
                .iter()
                .map(|&b| CustomerRecord {
                    balance: Some(b),
                    exited: Some(0),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn lowest_interval_is_closed() {
        let spec = BinSpec::edges(vec![0.0, 1.0, 50_000.0], ["Zero", "Low"]).unwrap();
        let out = bin(&balances(&[0.0, 1.0, 50_000.0]), "Balance", &spec).unwrap();
        let labels: Vec<&str> = out.rows().iter().map(|r| r.label(&out)).collect();
        assert_eq!(labels, ["Zero", "Zero", "Low"]);
        assert_eq!(out.dropped(), 0);
    }

    #[test]
    fn out_of_range_and_null_values_are_dropped() {
        let spec = BinSpec::edges(vec![0.0, 10.0], ["Only"]).unwrap();
        let mut ds = balances(&[-1.0, 5.0, 11.0]).records().to_vec();
        ds.push(CustomerRecord::default());
        let out = bin(&Dataset::new(ds), "Balance", &spec).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.dropped(), 3);
    }

    #[test]
    fn counts_follow_label_order() {
        let spec = BinSpec::edges(
            vec![300.0, 500.0, 600.0, 700.0, 800.0, 900.0],
            ["Poor", "Fair", "Good", "Very Good", "Excellent"],
        )
        .unwrap();
        let ds = Dataset::new(
            [850, 450, 650, 820]
                .iter()
                .map(|&s| CustomerRecord {
                    credit_score: Some(s),
                    ..Default::default()
                })
                .collect(),
        );
        let out = bin(&ds, "CreditScore", &spec).unwrap();
        assert_eq!(
            out.counts(),
            [("Poor", 1), ("Fair", 0), ("Good", 1), ("Very Good", 0), ("Excellent", 2)]
        );
    }

    #[test]
    fn equal_width_spans_observed_range() {
        let ds = balances(&[0.0, 25.0, 50.0, 75.0, 100.0]);
        let out = bin(&ds, "Balance", &BinSpec::equal_width(4).unwrap()).unwrap();
        assert_eq!(out.edges(), &[0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(out.labels()[0], "[0.00, 25.00]");
        assert_eq!(out.labels()[1], "(25.00, 50.00]");
        assert_eq!(out.dropped(), 0);
        let bins: Vec<usize> = out.rows().iter().map(|r| r.bin).collect();
        assert_eq!(bins, [0, 0, 1, 2, 3]);
    }

    #[test]
    fn equal_width_single_value() {
        let ds = balances(&[500.0, 500.0]);
        let out = bin(&ds, "Balance", &BinSpec::equal_width(3).unwrap()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.rows().iter().all(|r| r.bin == 1));
    }

    #[test]
    fn empty_dataset_bins_to_nothing() {
        let spec = BinSpec::equal_width_labeled(2, ["Low", "High"]).unwrap();
        let out = bin(&balances(&[]), "Balance", &spec).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.dropped(), 0);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(BinSpec::edges(vec![0.0, 10.0, 5.0], ["a", "b"]).is_err());
        assert!(BinSpec::edges(vec![0.0, 10.0, 10.0], ["a", "b"]).is_err());
        assert!(BinSpec::edges(vec![0.0, 10.0, 20.0], ["a"]).is_err());
        assert!(BinSpec::edges(vec![0.0, 10.0, 20.0], ["a", "a"]).is_err());
        assert!(BinSpec::equal_width(0).is_err());
        assert!(BinSpec::equal_width_labeled(3, ["a", "b"]).is_err());

        let spec = BinSpec::equal_width(2).unwrap();
        assert!(matches!(
            bin(&balances(&[1.0]), "Geography", &spec),
            Err(EngineError::InvalidSpec(_))
        ));
        assert!(matches!(
            bin(&balances(&[1.0]), "Wealth", &spec),
            Err(EngineError::SchemaMismatch { .. })
        ));
    }
}
