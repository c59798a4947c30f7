use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use murmur_feed::RequestContext;
use murmur_types::api::Claims;

use crate::state::{AppState, with_feed};

/// GET /profile/{name}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let ctx = RequestContext::from(&claims);
    let profile = with_feed(&state, move |feed| feed.profile(&ctx, &name)).await?;
    Ok(Json(profile))
}
