use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, Row, params};

use murmur_feed::{ReadMarkerPolicy, RetainedRows};

use crate::Database;
use crate::models::{ChannelRow, MessageRow, UserRow};

impl Database {
    // -- Users --
    //
    // Users belong to the external auth service; these exist so it (and tests)
    // can provision the profiles that messages are rendered with.

    pub fn create_user(&self, id: &str, name: &str, display_name: &str, avatar_icon: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, display_name, avatar_icon) VALUES (?1, ?2, ?3, ?4)",
                (id, name, display_name, avatar_icon),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_name(conn, name))
    }
}

// -- Users --

pub(crate) fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, display_name, avatar_icon FROM users WHERE id = ?1")?;
    let row = stmt.query_row([id], user_row).optional()?;
    Ok(row)
}

pub(crate) fn query_user_by_name(conn: &Connection, name: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, display_name, avatar_icon FROM users WHERE name = ?1")?;
    let row = stmt.query_row([name], user_row).optional()?;
    Ok(row)
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        avatar_icon: row.get(3)?,
    })
}

// -- Channels --

pub(crate) fn query_channels(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, name FROM channels ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn query_channel(conn: &Connection, id: i64) -> Result<Option<ChannelRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, description, created_at FROM channels WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ChannelRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub(crate) fn insert_channel(conn: &Connection, name: &str, description: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO channels (name, description) VALUES (?1, ?2)",
        (name, description),
    )?;
    Ok(conn.last_insert_rowid())
}

// -- Messages --

pub(crate) fn insert_message(conn: &Connection, channel_id: i64, user_id: &str, content: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO messages (channel_id, user_id, content) VALUES (?1, ?2, ?3)",
        params![channel_id, user_id, content],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn count_messages(conn: &Connection, channel_id: i64) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE channel_id = ?1",
        [channel_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub(crate) fn count_messages_after(conn: &Connection, channel_id: i64, after: i64) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE channel_id = ?1 AND id > ?2",
        [channel_id, after],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub(crate) fn query_recent_messages(
    conn: &Connection,
    channel_id: i64,
    after: Option<i64>,
    limit: u32,
) -> Result<Vec<MessageRow>> {
    let rows = match after {
        Some(after) => {
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, user_id, content, created_at
                 FROM messages
                 WHERE id > ?1 AND channel_id = ?2
                 ORDER BY id DESC
                 LIMIT ?3",
            )?;
            stmt.query_map(params![after, channel_id, limit], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, user_id, content, created_at
                 FROM messages
                 WHERE channel_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )?;
            stmt.query_map(params![channel_id, limit], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok(rows)
}

pub(crate) fn query_messages_page(
    conn: &Connection,
    channel_id: i64,
    limit: u32,
    offset: u64,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, channel_id, user_id, content, created_at
         FROM messages
         WHERE channel_id = ?1
         ORDER BY id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![channel_id, limit, offset as i64], message_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

// -- Read markers --

pub(crate) fn query_read_marker(conn: &Connection, user_id: &str, channel_id: i64) -> Result<Option<i64>> {
    let marker = conn
        .query_row(
            "SELECT message_id FROM read_markers WHERE user_id = ?1 AND channel_id = ?2",
            params![user_id, channel_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(marker)
}

pub(crate) fn query_read_markers_for_user(conn: &Connection, user_id: &str) -> Result<HashMap<i64, i64>> {
    let mut stmt =
        conn.prepare("SELECT channel_id, message_id FROM read_markers WHERE user_id = ?1")?;
    let markers = stmt
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(markers)
}

const UPSERT_MARKER_MONOTONIC: &str = "
    INSERT INTO read_markers (user_id, channel_id, message_id) VALUES (?1, ?2, ?3)
    ON CONFLICT (user_id, channel_id) DO UPDATE SET
        message_id = MAX(read_markers.message_id, excluded.message_id),
        updated_at = datetime('now')
    RETURNING message_id";

const UPSERT_MARKER_OVERWRITE: &str = "
    INSERT INTO read_markers (user_id, channel_id, message_id) VALUES (?1, ?2, ?3)
    ON CONFLICT (user_id, channel_id) DO UPDATE SET
        message_id = excluded.message_id,
        updated_at = datetime('now')
    RETURNING message_id";

pub(crate) fn upsert_read_marker(
    conn: &Connection,
    user_id: &str,
    channel_id: i64,
    message_id: i64,
    policy: ReadMarkerPolicy,
) -> Result<i64> {
    let sql = match policy {
        ReadMarkerPolicy::Monotonic => UPSERT_MARKER_MONOTONIC,
        ReadMarkerPolicy::Overwrite => UPSERT_MARKER_OVERWRITE,
    };
    let stored = conn.query_row(sql, params![user_id, channel_id, message_id], |row| row.get(0))?;
    Ok(stored)
}

// -- Admin --

pub(crate) fn reset(conn: &Connection, retain: &RetainedRows) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM read_markers", [])?;
    tx.execute(
        "DELETE FROM messages WHERE id > ?1 OR channel_id > ?2",
        [retain.messages, retain.channels],
    )?;
    tx.execute("DELETE FROM channels WHERE id > ?1", [retain.channels])?;
    tx.commit()?;
    Ok(())
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
