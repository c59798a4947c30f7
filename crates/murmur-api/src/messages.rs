use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use murmur_feed::RequestContext;
use murmur_types::api::{Claims, PostMessageRequest};
use murmur_types::{ChannelId, MessageId};

use crate::state::{AppState, with_feed};

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    /// Id of the newest message the client already has; 0 fetches the latest page.
    #[serde(default)]
    pub last_message_id: MessageId,
}

/// POST /channels/{channel_id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PostMessageRequest>,
) -> Result<StatusCode, StatusCode> {
    let ctx = RequestContext::from(&claims);
    with_feed(&state, move |feed| {
        feed.post_message(&ctx, channel_id, &req.content)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /channels/{channel_id}/messages?last_message_id=N
///
/// Returns up to 100 messages oldest first and advances the caller's read
/// marker to the newest one returned.
pub async fn poll_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Query(query): Query<PollQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let ctx = RequestContext::from(&claims);
    let messages = with_feed(&state, move |feed| {
        feed.poll(&ctx, channel_id, query.last_message_id)
    })
    .await?;

    Ok(Json(messages))
}
