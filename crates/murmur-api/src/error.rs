use axum::http::StatusCode;
use tracing::{error, warn};

use murmur_feed::FeedError;

pub fn status_for(err: &FeedError) -> StatusCode {
    match err {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
        FeedError::Cache(e) => {
            error!("Cache failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        e => {
            error!("Feed failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Parse a `page` query value; only plain decimal digits are accepted.
pub fn parse_page(raw: Option<&str>) -> Result<u32, StatusCode> {
    let raw = raw.unwrap_or("1");
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        warn!("Rejected non-numeric page '{}'", raw);
        return Err(StatusCode::BAD_REQUEST);
    }
    raw.parse().map_err(|_| StatusCode::BAD_REQUEST)
}
