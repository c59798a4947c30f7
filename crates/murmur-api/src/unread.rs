use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use murmur_feed::RequestContext;
use murmur_types::api::Claims;

use crate::state::{AppState, with_feed};

/// GET /unread
///
/// Unread count for every channel.
pub async fn fetch_unread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let ctx = RequestContext::from(&claims);
    let summary = with_feed(&state, move |feed| feed.unread_summary(&ctx)).await?;
    Ok(Json(summary))
}
