use anyhow::{Context, Result};
use churn_lens::cli::Args;
use churn_lens::config::{OutputFormat, ReportConfig};
use churn_lens::data::loader::load_file;
use churn_lens::state::{default_filters, Session};
use churn_lens::{report, Variable};
use clap::Parser;
use log::{info, warn};
use serde_json::json;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if !args.variables.is_empty() {
        config.variables = args.variables.clone();
    }
    if args.json {
        config.format = OutputFormat::Json;
    }

    let dataset = load_file(&args.input)?;
    let filters = match config.filters.clone() {
        Some(filters) => filters,
        None => default_filters(&dataset)?,
    };

    let mut session = Session::new(dataset, config.baseline);
    session
        .set_filters(filters)
        .context("applying report filters")?;
    info!(
        "{} of {} customers match the filters",
        session.filtered().len(),
        session.dataset().len()
    );

    if session.filtered().is_empty() {
        warn!("no data matches the selected filters");
    }

    match config.format {
        OutputFormat::Table => print_tables(&session, &config.variables()),
        OutputFormat::Json => print_json(&session, &config.variables()),
    }
}

fn print_tables(session: &Session, variables: &[Variable]) -> Result<()> {
    println!("=== Key Metrics ===");
    print!("{}", report::render_metrics(&session.metrics(), &session.insights()));

    for &variable in variables {
        let rows = session
            .analyze_or_empty(variable)
            .with_context(|| format!("analysing {variable}"))?;
        println!();
        print!(
            "{}",
            report::render_summary(&format!("Churn Rate by {variable}"), &rows)?
        );
    }
    Ok(())
}

fn print_json(session: &Session, variables: &[Variable]) -> Result<()> {
    let mut analyses = serde_json::Map::new();
    for &variable in variables {
        let rows = session
            .analyze_or_empty(variable)
            .with_context(|| format!("analysing {variable}"))?;
        analyses.insert(variable.display_name().to_string(), serde_json::to_value(rows)?);
    }
    let output = json!({
        "metrics": session.metrics(),
        "insights": session.insights(),
        "analyses": analyses,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
