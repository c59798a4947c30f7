use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ChannelId;
use crate::models::{AuthorProfile, MessageView};

// -- JWT Claims --

/// Claims minted by the external auth service. murmur only validates them;
/// `sub` is the user id every per-user operation is scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub content: String,
}

// -- Unread --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub channel_id: ChannelId,
    pub unread: u64,
}

// -- History --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub messages: Vec<MessageView>,
    pub page: u32,
    pub max_page: u32,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: String,
}

// -- Profiles --

/// A user's public profile, flagged when it belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: AuthorProfile,
    pub self_profile: bool,
}
