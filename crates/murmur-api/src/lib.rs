pub mod admin;
pub mod channels;
pub mod error;
pub mod history;
pub mod messages;
pub mod middleware;
pub mod profiles;
pub mod state;
pub mod unread;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use state::{AppState, AppStateInner};

/// All murmur routes. Everything except `/initialize` and `/health` requires
/// a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/initialize", post(admin::initialize))
        .route("/health", get(admin::health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/channels", get(channels::list_channels).post(channels::create_channel))
        .route("/channels/{channel_id}", get(channels::get_channel))
        .route(
            "/channels/{channel_id}/messages",
            get(messages::poll_messages).post(messages::post_message),
        )
        .route("/channels/{channel_id}/history", get(history::get_history))
        .route("/unread", get(unread::fetch_unread))
        .route("/profile/{name}", get(profiles::get_profile))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
