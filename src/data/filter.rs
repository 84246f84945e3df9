use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Attribute, CustomerRecord, Dataset, Value};
use crate::error::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// Filter specification: one constraint per attribute
// ---------------------------------------------------------------------------

/// A constraint on a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric range `[lo, hi]`.
    Range { lo: f64, hi: f64 },
    /// Exact membership. An empty set matches nothing.
    OneOf(BTreeSet<Value>),
}

impl Constraint {
    fn validate(&self, attribute: &str) -> EngineResult<()> {
        if let Constraint::Range { lo, hi } = self {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(EngineError::invalid_spec(format!(
                    "range for '{attribute}' has non-finite bounds [{lo}, {hi}]"
                )));
            }
            if lo > hi {
                return Err(EngineError::invalid_spec(format!(
                    "range for '{attribute}' has lo {lo} > hi {hi}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-attribute constraints, combined with logical AND.
///
/// Keyed by attribute name; names are checked against the dataset schema when
/// the spec is applied, so a spec can be built before any data is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    constraints: BTreeMap<String, Constraint>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inclusive range constraint, replacing any earlier constraint on
    /// the same attribute.
    pub fn range(mut self, attribute: impl Into<String>, lo: f64, hi: f64) -> EngineResult<Self> {
        self.insert(attribute, Constraint::Range { lo, hi })?;
        Ok(self)
    }

    /// Add a set-membership constraint.
    pub fn one_of<I, V>(mut self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let set = values.into_iter().map(Into::into).collect();
        self.constraints
            .insert(attribute.into(), Constraint::OneOf(set));
        self
    }

    pub fn insert(
        &mut self,
        attribute: impl Into<String>,
        constraint: Constraint,
    ) -> EngineResult<()> {
        let attribute = attribute.into();
        constraint.validate(&attribute)?;
        self.constraints.insert(attribute, constraint);
        Ok(())
    }

    pub fn get(&self, attribute: &str) -> Option<&Constraint> {
        self.constraints.get(attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.constraints.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Check every constraint for well-formedness. Specs built through the
    /// constructors are always valid; deserialized ones may not be.
    pub fn validate(&self) -> EngineResult<()> {
        self.constraints
            .iter()
            .try_for_each(|(attribute, c)| c.validate(attribute))
    }
}

// ---------------------------------------------------------------------------
// Resolution against a dataset
// ---------------------------------------------------------------------------

/// A constraint bound to a concrete schema column.
#[derive(Debug)]
enum Predicate {
    Range { attribute: Attribute, lo: f64, hi: f64 },
    Numbers { attribute: Attribute, allowed: Vec<f64> },
    Texts { attribute: Attribute, allowed: BTreeSet<String> },
}

impl Predicate {
    fn resolve(dataset: &Dataset, name: &str, constraint: &Constraint) -> EngineResult<Self> {
        let attribute = dataset.resolve(name)?;
        constraint.validate(name)?;

        match constraint {
            Constraint::Range { lo, hi } => {
                if !attribute.is_numeric() {
                    return Err(EngineError::invalid_spec(format!(
                        "range constraint on categorical attribute '{attribute}'"
                    )));
                }
                Ok(Predicate::Range {
                    attribute,
                    lo: *lo,
                    hi: *hi,
                })
            }
            Constraint::OneOf(values) if attribute.is_numeric() => {
                let allowed = values
                    .iter()
                    .map(|v| {
                        v.as_f64().ok_or_else(|| {
                            EngineError::invalid_spec(format!(
                                "value '{v}' cannot match numeric attribute '{attribute}'"
                            ))
                        })
                    })
                    .collect::<EngineResult<Vec<f64>>>()?;
                Ok(Predicate::Numbers { attribute, allowed })
            }
            Constraint::OneOf(values) => {
                let allowed = values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::Text(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                Ok(Predicate::Texts { attribute, allowed })
            }
        }
    }

    fn matches(&self, record: &CustomerRecord) -> bool {
        match self {
            Predicate::Range { attribute, lo, hi } => record
                .numeric(*attribute)
                .is_some_and(|v| *lo <= v && v <= *hi),
            Predicate::Numbers { attribute, allowed } => record
                .numeric(*attribute)
                .is_some_and(|v| allowed.contains(&v)),
            Predicate::Texts { attribute, allowed } => match record.value(*attribute) {
                Value::Text(s) => allowed.contains(&s),
                _ => false,
            },
        }
    }
}

/// Return a new dataset holding the records that satisfy every constraint,
/// in input order.
///
/// All constraints are resolved before any record is examined, so an unknown
/// attribute or malformed constraint fails the whole call. A record with a
/// null in a constrained attribute never matches.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> EngineResult<Dataset> {
    let predicates = spec
        .iter()
        .map(|(name, constraint)| Predicate::resolve(dataset, name, constraint))
        .collect::<EngineResult<Vec<_>>>()?;

    let kept: Vec<CustomerRecord> = dataset
        .records()
        .iter()
        .filter(|record| predicates.iter().all(|p| p.matches(record)))
        .cloned()
        .collect();

    debug!(
        "filter: {} constraint(s) kept {} of {} records",
        predicates.len(),
        kept.len(),
        dataset.len()
    );
    Ok(dataset.derive(kept))
}
