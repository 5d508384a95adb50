//! Backend service for the engineering stores climate dashboard.
//!
//! The service polls a spreadsheet-backed data source for periodic
//! temperature/humidity readings from a set of stores, cleans the snapshot
//! (date/time normalization, numeric coercion, invalid-row dropping),
//! classifies each store's latest reading against configured thresholds, and
//! serves the results to the presentation layer as JSON plus a filtered CSV
//! export.
//!
//! Module layout:
//! - [`loader`] – cached fetch from the external tabular source
//! - [`pipeline`] – cleaning, sorting, latest-per-store, window filters
//! - [`models`] – readings, thresholds, status classification
//! - [`export`] – CSV encoding of a filtered table
//! - [`routes`] – the HTTP surface consumed by the dashboard
//! - [`config`] – environment-driven configuration

pub mod config;
pub mod export;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod routes;

pub use config::Config;
pub use loader::{HttpSheetSource, LoaderError, SheetLoader, SheetSource};
pub use models::{RawRow, Reading, StatusLevel, Table, Thresholds};
