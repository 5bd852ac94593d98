//! Chart pipeline for the statistics dashboard
//!
//! Turns tabular responses from the national statistics API (PXWeb-style)
//! into chart-ready series with language-switchable labels:
//!
//! 1. Resolve dataset metadata (dimension codes + value labels, per language)
//! 2. Build a filter query in the API's expected shape
//! 3. Fetch the table rows
//! 4. Normalize rows into typed records (missing values stay missing)
//! 5. Shape records into time series or ranked category comparisons
//!
//! Everything downstream of the HTTP calls is pure and synchronous, so the
//! reshaping logic is testable without a network.

pub mod client;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod metadata;
pub mod normalize;
pub mod query;
pub mod shape;

pub use client::StatClient;
pub use error::{StatError, StatResult};
pub use fetch::RawRow;
pub use labels::{Labels, Lang};
pub use metadata::{DatasetMeta, Dimension};
pub use normalize::Record;
pub use query::{Filter, FilterQuery, QueryEntry};
pub use shape::{CategoryTable, SortDirection, TimeSeriesTable};
