use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::aggregate::AggregationRow;
use crate::data::metrics::{Contrast, Insights, MetricsReport};

// ---------------------------------------------------------------------------
// Summary tables
// ---------------------------------------------------------------------------

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Summary rows as a three-column batch: Category, Customer Count and
/// Churn Rate (%) rounded to one decimal.
pub fn summary_batch(rows: &[AggregationRow]) -> Result<RecordBatch, ArrowError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Category", DataType::Utf8, false),
        Field::new("Customer Count", DataType::UInt64, false),
        Field::new("Churn Rate (%)", DataType::Float64, false),
    ]));

    let categories: ArrayRef = Arc::new(StringArray::from_iter_values(
        rows.iter().map(|r| r.category.as_str()),
    ));
    let counts: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        rows.iter().map(|r| r.count as u64),
    ));
    let rates: ArrayRef = Arc::new(Float64Array::from_iter_values(
        rows.iter().map(|r| round1(r.churn_rate)),
    ));

    RecordBatch::try_new(schema, vec![categories, counts, rates])
}

/// Render summary rows as a text table. An empty summary renders as a
/// neutral notice rather than an empty grid.
pub fn render_summary(title: &str, rows: &[AggregationRow]) -> Result<String, ArrowError> {
    if rows.is_empty() {
        return Ok(format!("{title}\n  no data for the current filters\n"));
    }
    let table = pretty_format_batches(&[summary_batch(rows)?])?;
    Ok(format!("{title}\n{table}\n"))
}

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

fn contrast_line(name: &str, what: &str, contrast: Option<Contrast>) -> String {
    match contrast {
        Some(c) => format!("  {name:<22} {:.1}% vs {:.1}% ({what})\n", c.group, c.rest),
        None => String::new(),
    }
}

pub fn render_metrics(report: &MetricsReport, insights: &Insights) -> String {
    let mut out = format!("  {:<22} {}\n", "Total Customers", report.total_customers);
    out.push_str(&format!(
        "  {:<22} {:.1}% ({:+.1}% vs baseline)\n",
        "Churn Rate", report.churn_rate, report.churn_delta
    ));
    for scalar in &report.scalars {
        let line = match scalar.value {
            Some(v) => format!("  {:<22} {v:.1}\n", scalar.label),
            None => format!("  {:<22} no data\n", scalar.label),
        };
        out.push_str(&line);
    }
    out.push_str(&contrast_line(
        "Complaint Impact",
        "complained vs not",
        insights.complaint_impact,
    ));
    out.push_str(&contrast_line(
        "Satisfaction Impact",
        "low 1-2 vs high 4-5",
        insights.satisfaction_impact,
    ));
    out
}
