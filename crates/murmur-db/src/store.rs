//! `murmur-feed` store traits backed by SQLite.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use uuid::Uuid;

use murmur_feed::{
    AdminStore, AuthorDirectory, ChannelStore, MessageStore, ReadMarkerPolicy, ReadMarkerStore,
    RetainedRows,
};
use murmur_types::models::{AuthorProfile, Channel, ChannelSummary, Message};
use murmur_types::{ChannelId, MessageId};

use crate::Database;
use crate::models::MessageRow;
use crate::queries;

impl MessageStore for Database {
    fn append_message(&self, channel_id: ChannelId, user_id: Uuid, content: &str) -> Result<MessageId> {
        let uid = user_id.to_string();
        self.with_conn_mut(|conn| queries::insert_message(conn, channel_id, &uid, content))
    }

    fn count_messages(&self, channel_id: ChannelId) -> Result<u64> {
        self.with_conn(|conn| queries::count_messages(conn, channel_id))
    }

    fn count_messages_after(&self, channel_id: ChannelId, after: MessageId) -> Result<u64> {
        self.with_conn(|conn| queries::count_messages_after(conn, channel_id, after))
    }

    fn recent_messages(
        &self,
        channel_id: ChannelId,
        after: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        let rows = self.with_conn(|conn| queries::query_recent_messages(conn, channel_id, after, limit))?;
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    fn messages_page(&self, channel_id: ChannelId, limit: u32, offset: u64) -> Result<Vec<Message>> {
        let rows = self.with_conn(|conn| queries::query_messages_page(conn, channel_id, limit, offset))?;
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }
}

impl ReadMarkerStore for Database {
    fn last_read(&self, user_id: Uuid, channel_id: ChannelId) -> Result<Option<MessageId>> {
        let uid = user_id.to_string();
        self.with_conn(|conn| queries::query_read_marker(conn, &uid, channel_id))
    }

    fn read_markers_for_user(&self, user_id: Uuid) -> Result<HashMap<ChannelId, MessageId>> {
        let uid = user_id.to_string();
        self.with_conn(|conn| queries::query_read_markers_for_user(conn, &uid))
    }

    fn upsert_read_marker(
        &self,
        user_id: Uuid,
        channel_id: ChannelId,
        message_id: MessageId,
        policy: ReadMarkerPolicy,
    ) -> Result<MessageId> {
        let uid = user_id.to_string();
        self.with_conn_mut(|conn| queries::upsert_read_marker(conn, &uid, channel_id, message_id, policy))
    }
}

impl ChannelStore for Database {
    fn list_channels(&self) -> Result<Vec<ChannelSummary>> {
        let rows = self.with_conn(queries::query_channels)?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| ChannelSummary { id, name })
            .collect())
    }

    fn channel(&self, channel_id: ChannelId) -> Result<Option<Channel>> {
        let row = self.with_conn(|conn| queries::query_channel(conn, channel_id))?;
        Ok(row.map(|r| r.into_channel()))
    }

    fn insert_channel(&self, name: &str, description: &str) -> Result<Channel> {
        // Read back on the writer so the new row is visible regardless of reader lag.
        let row = self.with_conn_mut(|conn| {
            let id = queries::insert_channel(conn, name, description)?;
            queries::query_channel(conn, id)?.ok_or_else(|| anyhow!("Channel {} vanished after insert", id))
        })?;
        Ok(row.into_channel())
    }
}

impl AuthorDirectory for Database {
    fn author_profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>> {
        let row = self.get_user_by_id(&user_id.to_string())?;
        Ok(row.map(|r| r.into_profile()))
    }

    fn author_by_name(&self, name: &str) -> Result<Option<(Uuid, AuthorProfile)>> {
        let row = self.get_user_by_name(name)?;
        Ok(row.map(|r| r.into_author()))
    }
}

impl AdminStore for Database {
    fn reset(&self, retain: &RetainedRows) -> Result<()> {
        self.with_conn_mut(|conn| queries::reset(conn, retain))
    }
}
