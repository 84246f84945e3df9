//! Data layer: core types, loading, filtering, binning and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSpec → filtered Dataset ──────────┐
//!   └──────────┘                                          │
//!        │                                                ▼
//!        ▼                                          ┌──────────┐
//!   ┌──────────┐        ┌───────────┐               │ metrics   │  headline KPIs
//!   │  binner   │ ─────▶ │ aggregate  │  summary rows └──────────┘
//!   └──────────┘        └───────────┘
//! ```
//!
//! Every stage is a pure function of its inputs: nothing is cached and no
//! input is mutated, so independent sessions can run in parallel.

pub mod aggregate;
pub mod binner;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
