use std::sync::Arc;

use tracing::{debug, info};

use murmur_types::ChannelId;
use murmur_types::models::{Channel, ChannelSummary};

use crate::cache::CacheStore;
use crate::error::{CacheError, FeedError};
use crate::store::ChannelStore;

pub const DIRECTORY_KEY: &str = "channel_list";

/// Cached list of channels, independent of the per-channel counts.
pub struct ChannelDirectory {
    channels: Arc<dyn ChannelStore>,
    cache: Arc<dyn CacheStore>,
}

impl ChannelDirectory {
    pub fn new(channels: Arc<dyn ChannelStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self { channels, cache }
    }

    pub fn list_channels(&self) -> Result<Vec<ChannelSummary>, FeedError> {
        if let Some(raw) = self.cache.get(DIRECTORY_KEY)? {
            let list = serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
                key: DIRECTORY_KEY.to_string(),
                source,
            })?;
            return Ok(list);
        }

        let list = self.channels.list_channels()?;
        let encoded = serde_json::to_string(&list).map_err(|source| CacheError::Corrupt {
            key: DIRECTORY_KEY.to_string(),
            source,
        })?;
        self.cache.set(DIRECTORY_KEY, encoded)?;
        debug!(channels = list.len(), "channel directory populated from store");
        Ok(list)
    }

    pub fn channel(&self, channel_id: ChannelId) -> Result<Channel, FeedError> {
        if channel_id <= 0 {
            return Err(FeedError::InvalidChannelId(channel_id));
        }
        self.channels
            .channel(channel_id)?
            .ok_or(FeedError::ChannelNotFound(channel_id))
    }

    /// Insert a channel and drop the cached directory so the next listing
    /// includes it.
    pub fn create_channel(&self, name: &str, description: &str) -> Result<Channel, FeedError> {
        if name.trim().is_empty() {
            return Err(FeedError::EmptyChannelField("name"));
        }
        if description.trim().is_empty() {
            return Err(FeedError::EmptyChannelField("description"));
        }

        let channel = self.channels.insert_channel(name, description)?;
        self.invalidate()?;
        info!(channel_id = channel.id, name = %channel.name, "channel created");
        Ok(channel)
    }

    pub fn invalidate(&self) -> Result<(), FeedError> {
        self.cache.delete(DIRECTORY_KEY)?;
        Ok(())
    }
}
