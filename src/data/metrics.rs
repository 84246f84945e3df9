use serde::Serialize;

use super::model::{Attribute, CustomerRecord, Dataset};

/// Long-run churn rate of the bank, in percent. Headline churn is reported
/// as a delta against it.
pub const BASELINE_CHURN_RATE: f64 = 24.4;

/// A headline KPI computed as the mean of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarMetric {
    pub label: &'static str,
    pub attribute: Attribute,
    /// Multiplier applied to the mean (100 turns a 0/1 flag into a percentage).
    pub scale: f64,
}

/// The KPI cards shown above every dashboard.
pub const DEFAULT_SCALARS: [ScalarMetric; 5] = [
    ScalarMetric {
        label: "Avg Balance",
        attribute: Attribute::Balance,
        scale: 1.0,
    },
    ScalarMetric {
        label: "Complaint Rate",
        attribute: Attribute::Complain,
        scale: 100.0,
    },
    ScalarMetric {
        label: "Avg Satisfaction",
        attribute: Attribute::SatisfactionScore,
        scale: 1.0,
    },
    ScalarMetric {
        label: "Avg Credit Score",
        attribute: Attribute::CreditScore,
        scale: 1.0,
    },
    ScalarMetric {
        label: "Avg Products per Customer",
        attribute: Attribute::NumOfProducts,
        scale: 1.0,
    },
];

/// Value of one [`ScalarMetric`]. `value` is `None` when there is no data to
/// average: empty dataset, column absent from the source, or all nulls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarValue {
    pub label: &'static str,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub total_customers: usize,
    /// Percentage of customers who exited; 0 when there is no outcome data.
    pub churn_rate: f64,
    /// `churn_rate` minus the baseline it was computed against.
    pub churn_delta: f64,
    pub scalars: Vec<ScalarValue>,
}

impl MetricsReport {
    pub fn scalar(&self, label: &str) -> Option<f64> {
        self.scalars
            .iter()
            .find(|s| s.label == label)
            .and_then(|s| s.value)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (count, sum) = values.fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    (count > 0).then(|| sum / count as f64)
}

fn column_mean(dataset: &Dataset, attribute: Attribute) -> Option<f64> {
    if !dataset.has_column(attribute) {
        return None;
    }
    mean(dataset.numeric_values(attribute))
}

/// Headline KPIs with the default scalar set and baseline.
pub fn summarize(dataset: &Dataset) -> MetricsReport {
    summarize_with(dataset, &DEFAULT_SCALARS, BASELINE_CHURN_RATE)
}

/// Headline KPIs for a caller-chosen scalar set and churn baseline.
pub fn summarize_with(dataset: &Dataset, scalars: &[ScalarMetric], baseline: f64) -> MetricsReport {
    let churn_rate = churn_rate(dataset.records()).unwrap_or(0.0);
    MetricsReport {
        total_customers: dataset.len(),
        churn_rate,
        churn_delta: churn_rate - baseline,
        scalars: scalars
            .iter()
            .map(|m| ScalarValue {
                label: m.label,
                value: column_mean(dataset, m.attribute).map(|v| v * m.scale),
            })
            .collect(),
    }
}

fn churn_rate<'a>(records: impl IntoIterator<Item = &'a CustomerRecord>) -> Option<f64> {
    mean(records.into_iter().filter_map(|r| r.numeric(Attribute::Exited))).map(|m| m * 100.0)
}

// ---------------------------------------------------------------------------
// Insights: churn rate of two contrasting groups
// ---------------------------------------------------------------------------

/// Churn rates of two groups compared side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contrast {
    pub group: f64,
    pub rest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Customers who filed a complaint vs those who did not.
    pub complaint_impact: Option<Contrast>,
    /// Satisfaction scores 1–2 vs 4–5.
    pub satisfaction_impact: Option<Contrast>,
}

/// Churn rate of the records matching each predicate, reported only when both
/// groups have outcome data.
fn contrast(
    dataset: &Dataset,
    group: impl Fn(&CustomerRecord) -> bool,
    rest: impl Fn(&CustomerRecord) -> bool,
) -> Option<Contrast> {
    let records = dataset.records();
    let group = churn_rate(records.iter().filter(|r| group(*r)))?;
    let rest = churn_rate(records.iter().filter(|r| rest(*r)))?;
    Some(Contrast { group, rest })
}

pub fn insights(dataset: &Dataset) -> Insights {
    let complaint_impact = dataset
        .has_column(Attribute::Complain)
        .then(|| {
            contrast(
                dataset,
                |r| r.complain == Some(1),
                |r| r.complain == Some(0),
            )
        })
        .flatten();
    let satisfaction_impact = dataset
        .has_column(Attribute::SatisfactionScore)
        .then(|| {
            contrast(
                dataset,
                |r| matches!(r.satisfaction_score, Some(1 | 2)),
                |r| matches!(r.satisfaction_score, Some(4 | 5)),
            )
        })
        .flatten();
    Insights {
        complaint_impact,
        satisfaction_impact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(exited: i64, complain: i64, satisfaction: i64, balance: f64) -> CustomerRecord {
        CustomerRecord {
            exited: Some(exited),
            complain: Some(complain),
            satisfaction_score: Some(satisfaction),
            balance: Some(balance),
            ..Default::default()
        }
    }

    #[test]
    fn empty_dataset_has_defined_headline() {
        let report = summarize(&Dataset::new(Vec::new()));
        assert_eq!(report.total_customers, 0);
        assert_eq!(report.churn_rate, 0.0);
        assert!(report.scalars.iter().all(|s| s.value.is_none()));
        assert!((report.churn_delta + BASELINE_CHURN_RATE).abs() < 1e-12);
    }

    #[test]
    fn computes_rates_and_means() {
        let ds = Dataset::new(vec![
            customer(1, 1, 1, 100.0),
            customer(0, 0, 5, 300.0),
            customer(0, 0, 4, 200.0),
            customer(1, 0, 2, 0.0),
        ]);
        let report = summarize(&ds);
        assert_eq!(report.total_customers, 4);
        assert_eq!(report.churn_rate, 50.0);
        assert_eq!(report.scalar("Avg Balance"), Some(150.0));
        assert_eq!(report.scalar("Complaint Rate"), Some(25.0));
        assert_eq!(report.scalar("Avg Satisfaction"), Some(3.0));
        // No credit scores recorded: no data rather than zero.
        assert_eq!(report.scalar("Avg Credit Score"), None);
    }

    #[test]
    fn absent_columns_report_no_data() {
        let ds = Dataset::with_columns(vec![customer(1, 1, 3, 10.0)], [Attribute::Exited]);
        let report = summarize(&ds);
        assert_eq!(report.churn_rate, 100.0);
        assert_eq!(report.scalar("Avg Balance"), None);
    }

    #[test]
    fn insights_need_both_groups() {
        let ds = Dataset::new(vec![
            customer(1, 1, 1, 0.0),
            customer(1, 1, 2, 0.0),
            customer(0, 0, 5, 0.0),
            customer(1, 0, 4, 0.0),
        ]);
        let found = insights(&ds);
        assert_eq!(
            found.complaint_impact,
            Some(Contrast { group: 100.0, rest: 50.0 })
        );
        assert_eq!(
            found.satisfaction_impact,
            Some(Contrast { group: 100.0, rest: 50.0 })
        );

        let only_complainers = Dataset::new(vec![customer(1, 1, 3, 0.0)]);
        let found = insights(&only_complainers);
        assert_eq!(found.complaint_impact, None);
        assert_eq!(found.satisfaction_impact, None);
    }
}
