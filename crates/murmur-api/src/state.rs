use std::sync::Arc;

use axum::http::StatusCode;
use tracing::error;

use murmur_feed::{FeedAssembler, FeedError};

use crate::error::status_for;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub feed: FeedAssembler,
    pub jwt_secret: String,
}

/// Run a feed operation off the async runtime; the store and cache clients
/// are blocking.
pub async fn with_feed<T, F>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&FeedAssembler) -> Result<T, FeedError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.feed))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| status_for(&e))
}
