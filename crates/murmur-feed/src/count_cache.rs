use std::sync::Arc;

use tracing::debug;

use murmur_types::ChannelId;

use crate::cache::CacheStore;
use crate::error::{CacheError, FeedError};
use crate::store::MessageStore;

pub fn count_key(channel_id: ChannelId) -> String {
    format!("message_count:{}", channel_id)
}

/// Cache-aside message totals per channel.
///
/// Reads populate the cache from the store on a miss; writes bump the cached
/// value with the backend's atomic increment. The store remains the source of
/// truth: a failure between an append and its increment leaves the cached
/// value one short until the next reset.
pub struct CountCache {
    messages: Arc<dyn MessageStore>,
    cache: Arc<dyn CacheStore>,
}

impl CountCache {
    pub fn new(messages: Arc<dyn MessageStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self { messages, cache }
    }

    /// Cached total, or the exact store count on a miss (which is then cached).
    pub fn get_count(&self, channel_id: ChannelId) -> Result<u64, FeedError> {
        let key = count_key(channel_id);

        if let Some(raw) = self.cache.get(&key)? {
            return parse_count(&key, &raw);
        }

        let count = self.messages.count_messages(channel_id)?;
        self.cache.set(&key, count.to_string())?;
        debug!(channel_id, count, "message count cache miss, populated from store");
        Ok(count)
    }

    /// Bump the cached total by one. A cold key starts counting from 1.
    pub fn on_message_appended(&self, channel_id: ChannelId) -> Result<u64, FeedError> {
        let key = count_key(channel_id);
        let value = self.cache.incr(&key)?;
        u64::try_from(value).map_err(|_| CacheError::NotAnInteger { key }.into())
    }

    /// Store an exact value, replacing whatever is cached.
    pub fn seed(&self, channel_id: ChannelId, value: u64) -> Result<(), FeedError> {
        self.cache.set(&count_key(channel_id), value.to_string())?;
        Ok(())
    }

    /// Recount from the store and cache the result.
    pub fn refresh(&self, channel_id: ChannelId) -> Result<u64, FeedError> {
        let count = self.messages.count_messages(channel_id)?;
        self.seed(channel_id, count)?;
        Ok(count)
    }

    /// Drop every cached entry. The cache backend only offers a global flush,
    /// so this also clears the channel directory.
    pub fn reset(&self) -> Result<(), FeedError> {
        self.cache.flush_all()?;
        Ok(())
    }
}

fn parse_count(key: &str, raw: &str) -> Result<u64, FeedError> {
    raw.parse::<u64>().map_err(|_| {
        CacheError::NotAnInteger {
            key: key.to_string(),
        }
        .into()
    })
}
