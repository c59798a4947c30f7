//! Contracts the core expects from the relational store.
//!
//! All methods are synchronous; async callers run them on a blocking thread.
//! Row-returning scans come back newest first and the core reverses them.

use std::collections::HashMap;

use anyhow::Result;
use uuid::Uuid;

use murmur_types::models::{AuthorProfile, Channel, ChannelSummary, Message};
use murmur_types::{ChannelId, MessageId};

use crate::read_tracker::ReadMarkerPolicy;

pub trait MessageStore: Send + Sync {
    /// Append a message and return its store-assigned id.
    fn append_message(&self, channel_id: ChannelId, user_id: Uuid, content: &str)
    -> Result<MessageId>;

    /// Exact number of messages in the channel.
    fn count_messages(&self, channel_id: ChannelId) -> Result<u64>;

    /// Exact number of messages in the channel with id greater than `after`.
    fn count_messages_after(&self, channel_id: ChannelId, after: MessageId) -> Result<u64>;

    /// Up to `limit` messages, newest first, optionally restricted to ids
    /// greater than `after`.
    fn recent_messages(
        &self,
        channel_id: ChannelId,
        after: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<Message>>;

    /// One window of the channel log ordered by id descending.
    fn messages_page(&self, channel_id: ChannelId, limit: u32, offset: u64)
    -> Result<Vec<Message>>;
}

pub trait ReadMarkerStore: Send + Sync {
    fn last_read(&self, user_id: Uuid, channel_id: ChannelId) -> Result<Option<MessageId>>;

    fn read_markers_for_user(&self, user_id: Uuid) -> Result<HashMap<ChannelId, MessageId>>;

    /// Insert-or-update keyed by (user, channel) in a single statement.
    /// Returns the value stored after the write.
    fn upsert_read_marker(
        &self,
        user_id: Uuid,
        channel_id: ChannelId,
        message_id: MessageId,
        policy: ReadMarkerPolicy,
    ) -> Result<MessageId>;
}

pub trait ChannelStore: Send + Sync {
    /// All channels ordered by id.
    fn list_channels(&self) -> Result<Vec<ChannelSummary>>;

    fn channel(&self, channel_id: ChannelId) -> Result<Option<Channel>>;

    fn insert_channel(&self, name: &str, description: &str) -> Result<Channel>;
}

pub trait AuthorDirectory: Send + Sync {
    fn author_profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>>;

    /// Look a user up by unique name, returning their id with the profile.
    fn author_by_name(&self, name: &str) -> Result<Option<(Uuid, AuthorProfile)>>;
}

/// Rows with ids at or below these watermarks survive an administrative reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedRows {
    pub channels: ChannelId,
    pub messages: MessageId,
}

impl Default for RetainedRows {
    fn default() -> Self {
        // Keep the seeded `general` channel, drop every message.
        Self {
            channels: 1,
            messages: 0,
        }
    }
}

pub trait AdminStore: Send + Sync {
    /// Delete all read markers and every channel/message above the watermarks.
    fn reset(&self, retain: &RetainedRows) -> Result<()>;
}

/// Everything the [`crate::FeedAssembler`] needs from one backend.
pub trait FeedStore: MessageStore + ReadMarkerStore + ChannelStore + AuthorDirectory + AdminStore {}

impl<T> FeedStore for T where
    T: MessageStore + ReadMarkerStore + ChannelStore + AuthorDirectory + AdminStore
{
}
