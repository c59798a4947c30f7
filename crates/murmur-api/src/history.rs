use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use murmur_types::ChannelId;

use crate::error::parse_page;
use crate::state::{AppState, with_feed};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Kept as a string so malformed values are rejected with 400 by us,
    /// not by the extractor.
    pub page: Option<String>,
}

/// GET /channels/{channel_id}/history?page=P
pub async fn get_history(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let page = parse_page(query.page.as_deref())?;
    let history = with_feed(&state, move |feed| feed.history_page(channel_id, page)).await?;
    Ok(Json(history))
}
