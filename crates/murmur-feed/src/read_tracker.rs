use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use murmur_types::{ChannelId, MessageId};

use crate::error::FeedError;
use crate::store::ReadMarkerStore;

/// How a read-marker write treats an existing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMarkerPolicy {
    /// Keep the larger of the stored and the new id.
    #[default]
    Monotonic,
    /// Always store the new id, even if it is smaller (including 0 after an
    /// empty poll).
    Overwrite,
}

impl FromStr for ReadMarkerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monotonic" => Ok(Self::Monotonic),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!("unknown read marker policy: {}", other)),
        }
    }
}

impl fmt::Display for ReadMarkerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monotonic => f.write_str("monotonic"),
            Self::Overwrite => f.write_str("overwrite"),
        }
    }
}

/// Per-(user, channel) last-seen message id.
pub struct ReadTracker {
    markers: Arc<dyn ReadMarkerStore>,
    policy: ReadMarkerPolicy,
}

impl ReadTracker {
    pub fn new(markers: Arc<dyn ReadMarkerStore>, policy: ReadMarkerPolicy) -> Self {
        Self { markers, policy }
    }

    pub fn get_last_read(
        &self,
        user_id: Uuid,
        channel_id: ChannelId,
    ) -> Result<Option<MessageId>, FeedError> {
        Ok(self.markers.last_read(user_id, channel_id)?)
    }

    /// Record that the user has seen everything up to `message_id`.
    /// Returns the value actually stored, which under [`ReadMarkerPolicy::Monotonic`]
    /// may be larger than `message_id`.
    pub fn mark_read(
        &self,
        user_id: Uuid,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<MessageId, FeedError> {
        let stored = self
            .markers
            .upsert_read_marker(user_id, channel_id, message_id, self.policy)?;
        debug!(%user_id, channel_id, message_id, stored, policy = %self.policy, "read marker written");
        Ok(stored)
    }

    pub fn markers_for_user(&self, user_id: Uuid) -> Result<HashMap<ChannelId, MessageId>, FeedError> {
        Ok(self.markers.read_markers_for_user(user_id)?)
    }
}
