//! User-triggered refresh: invalidate the cache and re-fetch synchronously.

use std::sync::Arc;

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::loader::SheetLoader;
use crate::Config;

// ---

pub fn router() -> Router<(Arc<SheetLoader>, Config)> {
    // ---
    Router::new().route("/refresh", post(handler))
}

/// What the fresh fetch produced, including how much of the sheet was
/// unusable.
#[derive(Debug, Serialize)]
struct RefreshResponse {
    rows: usize,
    rows_read: usize,
    rows_dropped: usize,
}

/// Handle `POST /refresh`.
///
/// Invalidates the cache and completes a full re-fetch before responding, so
/// the presentation layer re-renders from the new table and never races a
/// stale read.
async fn handler(
    State((loader, config)): State<(Arc<SheetLoader>, Config)>,
) -> impl IntoResponse {
    // ---
    info!("POST /refresh - invalidating cache");
    loader.invalidate().await;

    match loader
        .load_with_report(&config.sheet_connection, &config.sheet_url)
        .await
    {
        Ok((table, report)) => {
            info!("Refresh complete: {} usable rows", table.len());
            (
                StatusCode::OK,
                Json(RefreshResponse {
                    rows: table.len(),
                    rows_read: report.rows_read,
                    rows_dropped: report.rows_dropped(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Refresh failed: {}", e);
            (StatusCode::BAD_GATEWAY, Json("Failed to fetch data")).into_response()
        }
    }
}
