use std::sync::Arc;

use axum::Router;

use crate::loader::SheetLoader;
use crate::Config;

mod export;
mod health;
mod refresh;
mod stores;

// ---

pub fn router(loader: Arc<SheetLoader>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(stores::router())
        .merge(export::router())
        .merge(refresh::router())
        .merge(health::router())
        .with_state((loader, config))
}
