//! Filtered CSV download of the current table.

use std::sync::Arc;

use axum::{
    extract::Query, extract::State, http::header, http::StatusCode, response::IntoResponse,
    routing::get, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use crate::loader::SheetLoader;
use crate::{export, pipeline, Config};

// ---

pub fn router() -> Router<(Arc<SheetLoader>, Config)> {
    // ---
    Router::new().route("/export", get(handler))
}

/// Query parameters for the export filter: store-set ∩ inclusive date range.
#[derive(Debug, Deserialize)]
struct ExportQuery {
    /// Comma-separated store labels; every enumerated store when absent.
    stores: Option<String>,
    /// Inclusive range start, `YYYY-MM-DD`.
    start: Option<NaiveDate>,
    /// Inclusive range end, `YYYY-MM-DD`.
    end: Option<NaiveDate>,
}

/// Handle `GET /export`: the filtered table as a UTF-8 CSV attachment,
/// column order preserved from the input schema.
async fn handler(
    Query(params): Query<ExportQuery>,
    State((loader, config)): State<(Arc<SheetLoader>, Config)>,
) -> impl IntoResponse {
    // ---
    info!("GET /export - filter: {:?}", params);

    let table = match loader.load(&config.sheet_connection, &config.sheet_url).await {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to load sheet: {}", e);
            return (StatusCode::BAD_GATEWAY, Json("Failed to fetch data")).into_response();
        }
    };

    let stores: Vec<String> = match params.stores {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => config.store_labels(),
    };

    let start = params.start.unwrap_or(NaiveDate::MIN);
    let end = params.end.unwrap_or(NaiveDate::MAX);

    let filtered = pipeline::window_filter(&pipeline::filter_stores(&table, &stores), start, end);

    match export::to_csv(&filtered) {
        Ok(bytes) => {
            info!("Exporting {} rows as CSV", filtered.len());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"searched_data.csv\"",
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("CSV export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json("Failed to encode CSV")).into_response()
        }
    }
}
