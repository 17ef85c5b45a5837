//! Message store: bounded text, required author, owner-scoped deletion.
//!
//! Deletion here is unconditional — ownership is checked by the caller
//! (the HTTP layer's authorization gate) before this store is touched.
//! No route may reach `delete_message` without that check.

use rusqlite::{Connection, OptionalExtension};
use warbler_types::models::MESSAGE_MAX_CHARS;

use crate::error::{StoreError, StoreResult, map_constraint};
use crate::models::MessageRow;
use crate::Database;

impl Database {
    /// Persist a message. Text must be non-empty and at most
    /// [`MESSAGE_MAX_CHARS`] characters; the author must exist.
    pub fn create_message(&self, id: &str, user_id: &str, text: &str) -> StoreResult<()> {
        if text.is_empty() {
            return Err(StoreError::validation("text must not be empty"));
        }
        if text.chars().count() > MESSAGE_MAX_CHARS {
            return Err(StoreError::validation(format!(
                "text must be at most {MESSAGE_MAX_CHARS} characters"
            )));
        }

        self.with_conn(|conn| {
            // The foreign key would also catch a missing author; checking
            // first gives the caller NotFound instead of a constraint error.
            let author_exists: bool = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |_| Ok(true))
                .optional()?
                .unwrap_or(false);
            if !author_exists {
                return Err(StoreError::NotFound);
            }

            conn.execute(
                "INSERT INTO messages (id, user_id, text) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, user_id, text],
            )
            .map_err(map_constraint)?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> StoreResult<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
                    [id],
                    row_to_message,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Remove a message; its likes go with it. Fails with `NotFound` for an
    /// unknown id so the caller can fold that into its uniform denial.
    pub fn delete_message(&self, id: &str) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM likes WHERE message_id = ?1", [id])?;
            let removed = tx.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(StoreError::NotFound);
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// A user's own messages, newest first.
    pub fn messages_for_user(&self, user_id: &str) -> StoreResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!("{MESSAGE_SELECT} WHERE m.user_id = ?1 ORDER BY m.created_at DESC"),
                user_id,
            )
        })
    }
}

// JOIN users to fetch author_username in a single query (eliminates N+1)
const MESSAGE_SELECT: &str = "SELECT m.id, m.user_id, u.username, m.text, m.created_at
     FROM messages m
     LEFT JOIN users u ON m.user_id = u.id";

pub(crate) fn query_messages(
    conn: &Connection,
    sql: &str,
    param: &str,
) -> StoreResult<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([param], row_to_message)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use warbler_types::models::MESSAGE_MAX_CHARS;

    use crate::test_util::{add_message, add_user, db};
    use crate::StoreError;

    #[test]
    fn create_and_fetch_message() {
        let db = db();
        let user = add_user(&db, "testuser");
        add_message(&db, &user, "test message");

        let messages = db.messages_for_user(&user).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "test message");
        assert_eq!(messages[0].author_username, "testuser");
    }

    #[test]
    fn message_requirements() {
        let db = db();
        let user = add_user(&db, "testuser");

        // Empty text.
        assert!(matches!(
            db.create_message("m1", &user, ""),
            Err(StoreError::Validation(_))
        ));

        // Unknown author.
        assert!(matches!(
            db.create_message("m2", "no-such-user", "test message"),
            Err(StoreError::NotFound)
        ));

        // Over the length bound.
        let long = "x".repeat(201);
        assert!(matches!(
            db.create_message("m3", &user, &long),
            Err(StoreError::Validation(_))
        ));

        // Exactly at the bound is fine.
        let max = "y".repeat(MESSAGE_MAX_CHARS);
        db.create_message("m4", &user, &max).unwrap();

        assert_eq!(db.messages_for_user(&user).unwrap().len(), 1);
    }

    #[test]
    fn length_bound_counts_characters_not_bytes() {
        let db = db();
        let user = add_user(&db, "testuser");

        // 140 multi-byte characters must pass.
        let text = "\u{00e9}".repeat(MESSAGE_MAX_CHARS);
        db.create_message("m1", &user, &text).unwrap();
    }

    #[test]
    fn schema_rejects_oversized_text() {
        let db = db();
        let user = add_user(&db, "testuser");

        // A write path that skips create_message still hits the CHECK.
        let long = "x".repeat(201);
        let result = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, user_id, text) VALUES (?1, ?2, ?3)",
                rusqlite::params!["m1", user, long],
            )?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(db.messages_for_user(&user).unwrap().is_empty());
    }

    #[test]
    fn delete_message_removes_likes() {
        let db = db();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let msg = add_message(&db, &author, "hello");

        assert!(db.toggle_like(&fan, &msg).unwrap());
        db.delete_message(&msg).unwrap();

        assert!(db.get_message(&msg).unwrap().is_none());
        assert!(db.likes_for_user(&fan).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_message_is_not_found() {
        let db = db();
        assert!(matches!(
            db.delete_message("nope"),
            Err(StoreError::NotFound)
        ));
    }
}
