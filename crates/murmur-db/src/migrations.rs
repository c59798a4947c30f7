use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Database: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                avatar_icon  TEXT NOT NULL DEFAULT 'default.png',
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE channels (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- AUTOINCREMENT: ids are never reused, even after a reset deletes rows.
            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_id  INTEGER NOT NULL REFERENCES channels(id),
                user_id     TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_channel
                ON messages(channel_id, id);

            CREATE TABLE read_markers (
                user_id     TEXT NOT NULL,
                channel_id  INTEGER NOT NULL REFERENCES channels(id),
                message_id  INTEGER NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, channel_id)
            );

            -- Seed the default general channel
            INSERT INTO channels (id, name, description)
                VALUES (1, 'general', 'Everything that fits nowhere else');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
