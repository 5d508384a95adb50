//! Per-store dashboard endpoints: live overview and charting series.

use std::sync::Arc;

use axum::{
    extract::Path, extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    routing::get, Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::loader::SheetLoader;
use crate::models::{Metric, StatusLevel, HUMIDITY, TEMPERATURE};
use crate::pipeline;
use crate::Config;

// ---

pub fn router() -> Router<(Arc<SheetLoader>, Config)> {
    // ---
    Router::new()
        .route("/stores", get(overview))
        .route("/stores/{store}/series", get(series))
}

// ---

/// One metric of one store's latest reading, classified.
///
/// `level` is `None` only for the explicit invalid-data condition (a
/// non-finite value that classification refused to compare).
#[derive(Debug, Serialize)]
struct MetricReport {
    value: f64,
    level: Option<StatusLevel>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LatestReading {
    timestamp: NaiveDateTime,
    temperature: MetricReport,
    humidity: MetricReport,
}

/// One store panel: the latest reading, or `latest: null` for "no data".
#[derive(Debug, Serialize)]
struct StoreOverview {
    store: String,
    latest: Option<LatestReading>,
}

fn metric_report(metric: &Metric, value: f64) -> MetricReport {
    // ---
    match metric.thresholds.classify(value) {
        Ok(level) => MetricReport {
            value,
            level: Some(level),
            message: metric.warning_message(value, level),
        },
        Err(_) => MetricReport {
            value,
            level: None,
            message: Some("Error: Invalid data encountered.".to_string()),
        },
    }
}

/// Handle `GET /stores`: latest reading and warnings for every store panel.
async fn overview(
    State((loader, config)): State<(Arc<SheetLoader>, Config)>,
) -> impl IntoResponse {
    // ---
    info!("GET /stores");

    let table = match loader.load(&config.sheet_connection, &config.sheet_url).await {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to load sheet: {}", e);
            return (StatusCode::BAD_GATEWAY, Json("Failed to fetch data")).into_response();
        }
    };

    let panels: Vec<StoreOverview> = config
        .store_labels()
        .into_iter()
        .map(|store| {
            let latest = pipeline::latest_for(&table, &store).map(|r| LatestReading {
                timestamp: r.timestamp,
                temperature: metric_report(&TEMPERATURE, r.temperature),
                humidity: metric_report(&HUMIDITY, r.humidity),
            });
            StoreOverview { store, latest }
        })
        .collect();

    (StatusCode::OK, Json(panels)).into_response()
}

// ---

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    /// `24h` restricts the series to the last 24 hours from now.
    window: Option<String>,
}

#[derive(Debug, Serialize)]
struct SeriesPoint {
    timestamp: NaiveDateTime,
    temperature: f64,
    humidity: f64,
}

/// Handle `GET /stores/{store}/series`: the time-series for one store's
/// charts, optionally windowed to the last 24 hours.
///
/// An unknown store yields an empty series; the presentation layer decides
/// how to render "no data".
async fn series(
    Path(store): Path<String>,
    Query(params): Query<SeriesQuery>,
    State((loader, config)): State<(Arc<SheetLoader>, Config)>,
) -> impl IntoResponse {
    // ---
    info!("GET /stores/{}/series (window={:?})", store, params.window);

    let table = match loader.load(&config.sheet_connection, &config.sheet_url).await {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to load sheet: {}", e);
            return (StatusCode::BAD_GATEWAY, Json("Failed to fetch data")).into_response();
        }
    };

    let mut rows = pipeline::filter_stores(&table, std::slice::from_ref(&store));
    if params.window.as_deref() == Some("24h") {
        rows = pipeline::last_24_hours(&rows, Local::now().naive_local());
    }

    let points: Vec<SeriesPoint> = rows
        .into_iter()
        .map(|r| SeriesPoint {
            timestamp: r.timestamp,
            temperature: r.temperature,
            humidity: r.humidity,
        })
        .collect();

    (StatusCode::OK, Json(points)).into_response()
}
