use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::Variable;
use crate::data::filter::FilterSpec;
use crate::data::metrics::BASELINE_CHURN_RATE;

/// How summary tables are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Report settings read from a JSON file.
///
/// ```json
/// {
///   "filters": {
///     "CreditScore": { "range": { "lo": 600, "hi": 850 } },
///     "Geography": { "one_of": ["France", "Spain"] }
///   },
///   "baseline": 24.4,
///   "variables": ["Complaints", "Age"],
///   "format": "table"
/// }
/// ```
///
/// Every field is optional. Without `filters` the dashboard defaults apply;
/// without `variables` every variable is analysed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub filters: Option<FilterSpec>,
    pub baseline: f64,
    pub variables: Vec<Variable>,
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            filters: None,
            baseline: BASELINE_CHURN_RATE,
            variables: Vec::new(),
            format: OutputFormat::Table,
        }
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ReportConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if let Some(filters) = &config.filters {
            filters.validate().context("invalid filters in config")?;
        }
        Ok(config)
    }

    /// Variables to report, all of them when none are configured.
    pub fn variables(&self) -> Vec<Variable> {
        if self.variables.is_empty() {
            Variable::ALL.to_vec()
        } else {
            self.variables.clone()
        }
    }
}
