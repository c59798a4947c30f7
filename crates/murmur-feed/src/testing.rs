//! In-memory doubles for the store and cache traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use chrono::Utc;
use uuid::Uuid;

use murmur_types::models::{AuthorProfile, Channel, ChannelSummary, Message};
use murmur_types::{ChannelId, MessageId};

use crate::cache::CacheStore;
use crate::error::CacheError;
use crate::read_tracker::ReadMarkerPolicy;
use crate::store::{
    AdminStore, AuthorDirectory, ChannelStore, MessageStore, ReadMarkerStore, RetainedRows,
};

#[derive(Default)]
struct Tables {
    channels: Vec<Channel>,
    messages: Vec<Message>,
    markers: HashMap<(Uuid, ChannelId), MessageId>,
    users: HashMap<Uuid, AuthorProfile>,
    next_channel_id: ChannelId,
    next_message_id: MessageId,
}

#[derive(Default)]
pub struct FakeStore {
    tables: Mutex<Tables>,
    count_calls: AtomicUsize,
    author_calls: AtomicUsize,
}

impl FakeStore {
    pub fn with_channels(names: &[&str]) -> Self {
        let store = Self::default();
        for name in names {
            store.insert_channel(name, "seeded").unwrap();
        }
        store
    }

    /// Append `n` messages from a throwaway author and return their ids in order.
    pub fn seed_messages(&self, channel_id: ChannelId, n: usize) -> Vec<MessageId> {
        let author = Uuid::new_v4();
        (0..n)
            .map(|i| self.append_message(channel_id, author, &format!("seed {}", i)).unwrap())
            .collect()
    }

    pub fn add_user(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().users.insert(
            id,
            AuthorProfile {
                name: name.to_string(),
                display_name: name.to_uppercase(),
                avatar_icon: "default.png".to_string(),
            },
        );
        id
    }

    /// Number of full-channel counts served by the store.
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn author_calls(&self) -> usize {
        self.author_calls.load(Ordering::SeqCst)
    }
}

impl MessageStore for FakeStore {
    fn append_message(&self, channel_id: ChannelId, user_id: Uuid, content: &str) -> Result<MessageId> {
        let mut t = self.tables.lock().unwrap();
        t.next_message_id += 1;
        let id = t.next_message_id;
        t.messages.push(Message {
            id,
            channel_id,
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn count_messages(&self, channel_id: ChannelId) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();
        Ok(t.messages.iter().filter(|m| m.channel_id == channel_id).count() as u64)
    }

    fn count_messages_after(&self, channel_id: ChannelId, after: MessageId) -> Result<u64> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages
            .iter()
            .filter(|m| m.channel_id == channel_id && m.id > after)
            .count() as u64)
    }

    fn recent_messages(
        &self,
        channel_id: ChannelId,
        after: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages
            .iter()
            .rev()
            .filter(|m| m.channel_id == channel_id && after.is_none_or(|a| m.id > a))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn messages_page(&self, channel_id: ChannelId, limit: u32, offset: u64) -> Result<Vec<Message>> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages
            .iter()
            .rev()
            .filter(|m| m.channel_id == channel_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

impl ReadMarkerStore for FakeStore {
    fn last_read(&self, user_id: Uuid, channel_id: ChannelId) -> Result<Option<MessageId>> {
        Ok(self.tables.lock().unwrap().markers.get(&(user_id, channel_id)).copied())
    }

    fn read_markers_for_user(&self, user_id: Uuid) -> Result<HashMap<ChannelId, MessageId>> {
        let t = self.tables.lock().unwrap();
        Ok(t.markers
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|((_, cid), mid)| (*cid, *mid))
            .collect())
    }

    fn upsert_read_marker(
        &self,
        user_id: Uuid,
        channel_id: ChannelId,
        message_id: MessageId,
        policy: ReadMarkerPolicy,
    ) -> Result<MessageId> {
        let mut t = self.tables.lock().unwrap();
        let slot = t.markers.entry((user_id, channel_id)).or_insert(message_id);
        *slot = match policy {
            ReadMarkerPolicy::Monotonic => (*slot).max(message_id),
            ReadMarkerPolicy::Overwrite => message_id,
        };
        Ok(*slot)
    }
}

impl ChannelStore for FakeStore {
    fn list_channels(&self) -> Result<Vec<ChannelSummary>> {
        let t = self.tables.lock().unwrap();
        Ok(t.channels.iter().map(ChannelSummary::from).collect())
    }

    fn channel(&self, channel_id: ChannelId) -> Result<Option<Channel>> {
        let t = self.tables.lock().unwrap();
        Ok(t.channels.iter().find(|c| c.id == channel_id).cloned())
    }

    fn insert_channel(&self, name: &str, description: &str) -> Result<Channel> {
        let mut t = self.tables.lock().unwrap();
        if t.channels.iter().any(|c| c.name == name) {
            return Err(anyhow!("channel name taken: {}", name));
        }
        t.next_channel_id += 1;
        let channel = Channel {
            id: t.next_channel_id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        t.channels.push(channel.clone());
        Ok(channel)
    }
}

impl AuthorDirectory for FakeStore {
    fn author_profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>> {
        self.author_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().unwrap().users.get(&user_id).cloned())
    }

    fn author_by_name(&self, name: &str) -> Result<Option<(Uuid, AuthorProfile)>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .find(|(_, profile)| profile.name == name)
            .map(|(id, profile)| (*id, profile.clone())))
    }
}

impl AdminStore for FakeStore {
    fn reset(&self, retain: &RetainedRows) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        t.markers.clear();
        t.messages
            .retain(|m| m.id <= retain.messages && m.channel_id <= retain.channels);
        t.channels.retain(|c| c.id <= retain.channels);
        Ok(())
    }
}

/// Cache whose backend is always down.
pub struct UnavailableCache;

impl CacheStore for UnavailableCache {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn flush_all(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}
