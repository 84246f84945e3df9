//! Ready-made analyses: the attributes the dashboard slices churn by, each
//! with the binning or labelling it is shown with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::aggregate::{aggregate, aggregate_binned, relabel, AggregationRow};
use crate::data::binner::{bin, BinSpec};
use crate::data::model::{Attribute, Dataset};
use crate::error::{EngineError, EngineResult};

pub const COMPLAINT_LABELS: [(&str, &str); 2] = [("0", "No Complaints"), ("1", "Filed Complaints")];
pub const ACTIVITY_LABELS: [(&str, &str); 2] = [("0", "Inactive"), ("1", "Active")];

/// Balance ranges used by the key-predictor view.
pub fn balance_ranges() -> BinSpec {
    BinSpec::Edges {
        edges: vec![0.0, 1.0, 50_000.0, 100_000.0, 150_000.0, 300_000.0],
        labels: labels(["Zero", "Low", "Medium", "High", "Very High"]),
    }
}

pub fn credit_bands() -> BinSpec {
    BinSpec::Edges {
        edges: vec![300.0, 500.0, 600.0, 700.0, 800.0, 900.0],
        labels: labels(["Poor", "Fair", "Good", "Very Good", "Excellent"]),
    }
}

/// Age groups of the demographics view.
pub fn age_groups() -> BinSpec {
    BinSpec::Edges {
        edges: vec![18.0, 30.0, 40.0, 50.0, 60.0, 100.0],
        labels: labels([
            "Young (18-30)",
            "Adult (30-40)",
            "Middle (40-50)",
            "Mature (50-60)",
            "Senior (60+)",
        ]),
    }
}

/// Same boundaries as [`age_groups`] with the short labels of the
/// variable selector.
pub fn age_bands() -> BinSpec {
    BinSpec::Edges {
        edges: vec![18.0, 30.0, 40.0, 50.0, 60.0, 100.0],
        labels: labels(["Young", "Adult", "Middle", "Mature", "Senior"]),
    }
}

pub fn tenure_bands() -> BinSpec {
    BinSpec::Edges {
        edges: vec![0.0, 2.0, 4.0, 6.0, 8.0, 11.0],
        labels: labels(["New", "Growing", "Stable", "Mature", "Loyal"]),
    }
}

/// Five equal-width balance bins over the observed range.
pub fn balance_quintiles() -> BinSpec {
    BinSpec::EqualWidth {
        bins: 5,
        labels: Some(labels(["Very Low", "Low", "Medium", "High", "Very High"])),
    }
}

fn labels<const N: usize>(names: [&str; N]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// An attribute offered for ad hoc churn analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variable {
    Complaints,
    #[serde(rename = "Satisfaction Score")]
    SatisfactionScore,
    Balance,
    #[serde(rename = "Credit Score")]
    CreditScore,
    #[serde(rename = "Number of Products")]
    NumberOfProducts,
    #[serde(rename = "Activity Status")]
    ActivityStatus,
    Age,
    Geography,
    Gender,
    Tenure,
}

impl Variable {
    pub const ALL: [Variable; 10] = [
        Variable::Complaints,
        Variable::SatisfactionScore,
        Variable::Balance,
        Variable::CreditScore,
        Variable::NumberOfProducts,
        Variable::ActivityStatus,
        Variable::Age,
        Variable::Geography,
        Variable::Gender,
        Variable::Tenure,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Variable::Complaints => "Complaints",
            Variable::SatisfactionScore => "Satisfaction Score",
            Variable::Balance => "Balance",
            Variable::CreditScore => "Credit Score",
            Variable::NumberOfProducts => "Number of Products",
            Variable::ActivityStatus => "Activity Status",
            Variable::Age => "Age",
            Variable::Geography => "Geography",
            Variable::Gender => "Gender",
            Variable::Tenure => "Tenure",
        }
    }

    pub fn attribute(self) -> Attribute {
        match self {
            Variable::Complaints => Attribute::Complain,
            Variable::SatisfactionScore => Attribute::SatisfactionScore,
            Variable::Balance => Attribute::Balance,
            Variable::CreditScore => Attribute::CreditScore,
            Variable::NumberOfProducts => Attribute::NumOfProducts,
            Variable::ActivityStatus => Attribute::IsActiveMember,
            Variable::Age => Attribute::Age,
            Variable::Geography => Attribute::Geography,
            Variable::Gender => Attribute::Gender,
            Variable::Tenure => Attribute::Tenure,
        }
    }

    /// Continuous attributes are binned before grouping.
    pub fn bin_spec(self) -> Option<BinSpec> {
        match self {
            Variable::Balance => Some(balance_quintiles()),
            Variable::CreditScore => Some(credit_bands()),
            Variable::Age => Some(age_bands()),
            Variable::Tenure => Some(tenure_bands()),
            _ => None,
        }
    }

    fn labels(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Variable::Complaints => &COMPLAINT_LABELS,
            Variable::ActivityStatus => &ACTIVITY_LABELS,
            _ => &[],
        }
    }

    /// Churn summary of `dataset` sliced by this variable.
    pub fn analyze(self, dataset: &Dataset) -> EngineResult<Vec<AggregationRow>> {
        let name = self.attribute().name();
        let outcome = Attribute::Exited.name();
        match self.bin_spec() {
            Some(spec) => aggregate_binned(&bin(dataset, name, &spec)?, outcome),
            None => Ok(relabel(aggregate(dataset, name, outcome)?, self.labels())),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Variable {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Variable::ALL
            .iter()
            .copied()
            .find(|v| v.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EngineError::invalid_spec(format!("unknown variable '{s}'")))
    }
}
