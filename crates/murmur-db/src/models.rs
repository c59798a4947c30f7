//! Database row types. These map directly to SQLite rows.
//! Distinct from murmur-types models to keep the DB layer independent.
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use murmur_types::models::{AuthorProfile, Channel, Message};

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub avatar_icon: String,
}

impl UserRow {
    pub fn into_profile(self) -> AuthorProfile {
        AuthorProfile {
            name: self.name,
            display_name: self.display_name,
            avatar_icon: self.avatar_icon,
        }
    }

    /// The user's id alongside their profile.
    pub fn into_author(self) -> (Uuid, AuthorProfile) {
        let id = self.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt id '{}' on user {}: {}", self.id, self.name, e);
            Uuid::default()
        });
        (id, self.into_profile())
    }
}

pub struct ChannelRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl ChannelRow {
    pub fn into_channel(self) -> Channel {
        Channel {
            created_at: parse_timestamp(&self.created_at, "channel", self.id),
            id: self.id,
            name: self.name,
            description: self.description,
        }
    }
}

pub struct MessageRow {
    pub id: i64,
    pub channel_id: i64,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        Message {
            user_id: self.user_id.parse().unwrap_or_else(|e| {
                warn!("Corrupt user_id '{}' on message {}: {}", self.user_id, self.id, e);
                Uuid::default()
            }),
            created_at: parse_timestamp(&self.created_at, "message", self.id),
            id: self.id,
            channel_id: self.channel_id,
            content: self.content,
        }
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone; they
/// are always UTC.
fn parse_timestamp(raw: &str, kind: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, kind, id, e);
            DateTime::default()
        })
}
