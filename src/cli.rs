//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::analysis::Variable;

/// Churn-rate report over a bank customer dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Customer dataset (.csv, .json or .parquet)
    #[arg(short, long, default_value = "Customer-Churn-Records.csv")]
    pub input: PathBuf,

    /// JSON report configuration (filters, baseline, variables, format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Variable to analyse; repeat for several. Overrides the config file.
    /// Example: --variable "Credit Score" --variable Geography
    #[arg(long = "variable", value_parser = parse_variable)]
    pub variables: Vec<Variable>,

    /// Emit JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_variable(s: &str) -> Result<Variable, String> {
    s.parse().map_err(|e| format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_variables() {
        let args = Args::try_parse_from([
            "churn-lens",
            "--input",
            "data.csv",
            "--variable",
            "Credit Score",
            "--variable",
            "age",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.input, PathBuf::from("data.csv"));
        assert_eq!(args.variables, [Variable::CreditScore, Variable::Age]);
        assert!(args.json);
        assert!(args.config.is_none());

        assert!(Args::try_parse_from(["churn-lens", "--variable", "Salary"]).is_err());
    }
}
