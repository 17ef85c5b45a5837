use rusqlite::Connection;
use tracing::info;

use crate::StoreResult;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE CHECK (length(username) > 0),
            email       TEXT NOT NULL UNIQUE CHECK (length(email) > 0),
            password    TEXT NOT NULL CHECK (length(password) > 0),
            image_url   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text        TEXT NOT NULL
                        CHECK (length(text) > 0 AND length(text) <= 140),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user
            ON messages(user_id, created_at);

        -- Edge direction: a row means follower_id follows followed_id.
        -- The composite primary key makes duplicate edges impossible.
        CREATE TABLE IF NOT EXISTS follows (
            followed_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            follower_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (followed_id, follower_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_follower
            ON follows(follower_id);

        -- At most one like per (user, message) pair.
        CREATE TABLE IF NOT EXISTS likes (
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message_id  TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, message_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_message
            ON likes(message_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
