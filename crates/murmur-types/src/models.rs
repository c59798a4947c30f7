use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ChannelId, MessageId};

/// Rendering used for `MessageView::date`.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Entry in the cached channel directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: String,
}

impl From<&Channel> for ChannelSummary {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name.clone(),
        }
    }
}

/// A stored message. Append-only; never updated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user, attached to every rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub name: String,
    pub display_name: String,
    pub avatar_icon: String,
}

/// A message as returned to clients: enriched with its author and with a
/// pre-rendered timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub user: Option<AuthorProfile>,
    pub date: String,
    pub content: String,
}

impl MessageView {
    pub fn new(message: Message, user: Option<AuthorProfile>) -> Self {
        Self {
            id: message.id,
            user,
            date: message.created_at.format(DATE_FORMAT).to_string(),
            content: message.content,
        }
    }
}
