use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use murmur_types::ChannelId;
use murmur_types::api::CreateChannelRequest;

use crate::state::{AppState, with_feed};

/// GET /channels
pub async fn list_channels(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let channels = with_feed(&state, |feed| feed.list_channels()).await?;
    Ok(Json(channels))
}

/// GET /channels/{channel_id}
pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
) -> Result<impl IntoResponse, StatusCode> {
    let channel = with_feed(&state, move |feed| feed.channel(channel_id)).await?;
    Ok(Json(channel))
}

/// POST /channels
pub async fn create_channel(
    State(state): State<AppState>,
    Json(req): Json<CreateChannelRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let channel = with_feed(&state, move |feed| {
        feed.create_channel(&req.name, &req.description)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(channel)))
}
