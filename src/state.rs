use log::warn;

use crate::analysis::Variable;
use crate::data::aggregate::AggregationRow;
use crate::data::filter::{apply, FilterSpec};
use crate::data::metrics::{
    insights, summarize_with, Insights, MetricsReport, DEFAULT_SCALARS,
};
use crate::data::model::{Attribute, Dataset, Value};
use crate::error::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One dashboard session: the loaded dataset, the active filters and the
/// records passing them. The session owns its dataset; engine calls borrow it
/// for the duration of a request only.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    filters: FilterSpec,
    filtered: Dataset,
    baseline: f64,
}

impl Session {
    /// Start a session with no filters applied.
    pub fn new(dataset: Dataset, baseline: f64) -> Self {
        Self {
            filtered: dataset.clone(),
            dataset,
            filters: FilterSpec::new(),
            baseline,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    /// Records passing the current filters.
    pub fn filtered(&self) -> &Dataset {
        &self.filtered
    }

    /// Replace the active filters. On error the previous filters and view
    /// are kept.
    pub fn set_filters(&mut self, filters: FilterSpec) -> EngineResult<()> {
        let filtered = apply(&self.dataset, &filters)?;
        self.filters = filters;
        self.filtered = filtered;
        Ok(())
    }

    /// Headline KPIs of the filtered view.
    pub fn metrics(&self) -> MetricsReport {
        summarize_with(&self.filtered, &DEFAULT_SCALARS, self.baseline)
    }

    pub fn insights(&self) -> Insights {
        insights(&self.filtered)
    }

    /// Churn summary of the filtered view sliced by `variable`.
    pub fn analyze(&self, variable: Variable) -> EngineResult<Vec<AggregationRow>> {
        variable.analyze(&self.filtered)
    }

    /// Like [`Session::analyze`], but a variable whose column the dataset
    /// lacks yields an empty summary and a warning. Other errors propagate.
    pub fn analyze_or_empty(&self, variable: Variable) -> EngineResult<Vec<AggregationRow>> {
        match self.analyze(variable) {
            Err(EngineError::SchemaMismatch { attribute }) => {
                warn!("cannot analyse {variable}: column '{attribute}' is missing");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

/// The initial filter state: full credit score and age ranges, balance from
/// zero to the observed maximum, every geography selected. Attributes the
/// dataset lacks or has no values for are left unconstrained.
pub fn default_filters(dataset: &Dataset) -> EngineResult<FilterSpec> {
    let mut spec = FilterSpec::new();
    for attr in [Attribute::CreditScore, Attribute::Age] {
        if let Some((lo, hi)) = dataset.numeric_range(attr) {
            spec = spec.range(attr.name(), lo, hi)?;
        }
    }
    if let Some((_, hi)) = dataset.numeric_range(Attribute::Balance) {
        spec = spec.range(Attribute::Balance.name(), 0.0, hi.max(0.0))?;
    }
    let geographies = dataset.unique_values(Attribute::Geography);
    if !geographies.is_empty() {
        spec = spec.one_of(
            Attribute::Geography.name(),
            geographies.into_iter().collect::<Vec<Value>>(),
        );
    }
    Ok(spec)
}
