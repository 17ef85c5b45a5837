//! Database row types — these map directly to SQLite rows.
//! Distinct from the warbler-types API models; conversion drops the
//! credential and parses ids/timestamps.

use tracing::warn;
use uuid::Uuid;
use warbler_types::models::{Message, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub user_id: String,
    pub author_username: String,
    pub text: String,
    pub created_at: String,
}

pub struct LikeRow {
    pub user_id: String,
    pub message_id: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: parse_id(&self.id, "user"),
            username: self.username,
            email: self.email,
            image_url: self.image_url,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        Message {
            id: parse_id(&self.id, "message"),
            user_id: parse_id(&self.user_id, "author"),
            text: self.text,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; fall back for RFC 3339 strings.
pub fn parse_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .or_else(|_| raw.parse::<chrono::DateTime<chrono::Utc>>())
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            chrono::DateTime::default()
        })
}
