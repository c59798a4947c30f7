use axum::{extract::State, http::StatusCode};
use tracing::info;

use crate::state::{AppState, with_feed};

/// POST /initialize
///
/// Wipe messages, read markers and caches back to the
/// configured baseline. Not authenticated; restrict it at the deployment edge.
pub async fn initialize(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    with_feed(&state, |feed| feed.reset()).await?;
    info!("Initialize request completed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}
