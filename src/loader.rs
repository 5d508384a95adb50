//! Cached loader for the spreadsheet-backed data source.
//!
//! The transport is behind the [`SheetSource`] trait so the rest of the
//! service never sees HTTP: production uses [`HttpSheetSource`] to pull the
//! sheet's CSV export, tests inject a fake. The loader owns the only shared
//! state in the process — a freshness-windowed cache keyed by
//! `(connection name, locator)` — and replaces entries wholesale, never
//! patching a published table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{RawRow, Table};
use crate::pipeline::{self, CleanReport};

// ---

/// Raised when the external source cannot produce a usable snapshot.
///
/// Covers network failures and structurally malformed tabular data alike; in
/// either case no table is published and the caller decides the fallback.
#[derive(Debug, Error)]
#[error("failed to fetch sheet '{locator}' via connection '{connection}': {source}")]
pub struct LoaderError {
    pub connection: String,
    pub locator: String,
    #[source]
    pub source: anyhow::Error,
}

/// A remote tabular data source addressed by connection name and locator.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch the full raw snapshot.
    ///
    /// Must return all rows or an error — a partial or garbled snapshot is an
    /// error, never a short result.
    async fn fetch(&self, connection: &str, locator: &str) -> anyhow::Result<Vec<RawRow>>;
}

/// Production source: the locator is a URL whose body is the sheet as CSV
/// (e.g. a Google Sheets CSV export link).
pub struct HttpSheetSource {
    client: reqwest::Client,
}

impl HttpSheetSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSheetSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    async fn fetch(&self, connection: &str, locator: &str) -> anyhow::Result<Vec<RawRow>> {
        // ---
        debug!("Fetching sheet via '{}' from: {}", connection, locator);

        let body = self
            .client
            .get(locator)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let mut rows = Vec::new();
        for record in reader.deserialize::<RawRow>() {
            // A structurally broken record means a garbled snapshot; bail
            // rather than hand a partial table downstream.
            rows.push(record?);
        }

        debug!("Fetched {} raw rows", rows.len());
        Ok(rows)
    }
}

// ---

struct CacheEntry {
    table: Arc<Table>,
    report: CleanReport,
    fetched_at: Instant,
}

/// Loads, cleans, and caches tables from a [`SheetSource`].
///
/// Within the freshness window repeated loads return the same `Arc` without
/// touching the remote source; [`SheetLoader::invalidate`] forces the next
/// load to re-fetch. The cache mutex is held across the fetch so a refresh
/// can never race a stale read for the same key.
pub struct SheetLoader {
    source: Arc<dyn SheetSource>,
    ttl: Duration,
    cache: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl SheetLoader {
    pub fn new(source: Arc<dyn SheetSource>, ttl: Duration) -> Self {
        // ---
        Self {
            source,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load the cleaned, time-sorted table for `(connection, locator)`.
    pub async fn load(
        &self,
        connection: &str,
        locator: &str,
    ) -> Result<Arc<Table>, LoaderError> {
        // ---
        self.load_with_report(connection, locator)
            .await
            .map(|(table, _)| table)
    }

    /// Like [`SheetLoader::load`], also returning the cleaning tally for the
    /// snapshot the table was built from.
    pub async fn load_with_report(
        &self,
        connection: &str,
        locator: &str,
    ) -> Result<(Arc<Table>, CleanReport), LoaderError> {
        // ---
        let key = (connection.to_string(), locator.to_string());
        let mut cache = self.cache.lock().await;

        if let Some(entry) = cache.get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("Cache hit for '{}' ({} rows)", connection, entry.table.len());
                return Ok((Arc::clone(&entry.table), entry.report));
            }
        }

        let rows = self
            .source
            .fetch(connection, locator)
            .await
            .map_err(|source| LoaderError {
                connection: connection.to_string(),
                locator: locator.to_string(),
                source,
            })?;

        let (cleaned, report) = pipeline::clean(&rows);
        let table = Arc::new(pipeline::sort_by_time(&cleaned));

        info!(
            "Refreshed table for '{}': kept {} of {} rows ({} dropped)",
            connection,
            report.rows_kept,
            report.rows_read,
            report.rows_dropped()
        );

        cache.insert(
            key,
            CacheEntry {
                table: Arc::clone(&table),
                report,
                fetched_at: Instant::now(),
            },
        );

        Ok((table, report))
    }

    /// Drop every cached entry so the next load re-fetches.
    pub async fn invalidate(&self) {
        // ---
        let mut cache = self.cache.lock().await;
        let evicted = cache.len();
        cache.clear();
        debug!("Cache invalidated ({} entries evicted)", evicted);
    }
}
