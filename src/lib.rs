//! churn-lens: churn-rate statistics over bank customer records.
//!
//! The engine in [`data`] filters a customer [`Dataset`], bins continuous
//! attributes into labeled categories and summarises the churn outcome per
//! category. Everything is synchronous and pure; callers own their datasets
//! and pass them into each call.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod state;

pub use analysis::Variable;
pub use data::aggregate::{aggregate, aggregate_binned, AggregationRow};
pub use data::binner::{bin, BinSpec, BinnedDataset};
pub use data::filter::{apply, Constraint, FilterSpec};
pub use data::metrics::{summarize, MetricsReport};
pub use data::model::{Attribute, CustomerRecord, Dataset, Value};
pub use error::{EngineError, EngineResult};
pub use state::Session;
