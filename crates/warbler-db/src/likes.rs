//! Like index: at most one like per (user, message) pair.
//!
//! `toggle_like` is the only mutation routes go through. It runs as a
//! read-then-write inside a transaction; if a racing insert still trips
//! the pair constraint, that is treated as "already liked, now unlike"
//! rather than surfaced to the caller.

use rusqlite::OptionalExtension;

use crate::error::{StoreError, StoreResult, map_constraint};
use crate::messages::row_to_message;
use crate::models::{LikeRow, MessageRow};
use crate::Database;

impl Database {
    /// Raw insert; trips `Duplicate("like")` on a second like of the same
    /// message by the same user. Prefer [`Database::toggle_like`] in routes.
    pub fn insert_like(&self, user_id: &str, message_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )
            .map_err(map_constraint)?;
            Ok(())
        })
    }

    /// Returns true if a like was removed.
    pub fn remove_like(&self, user_id: &str, message_id: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Insert the like if absent, remove it if present. Returns true when
    /// the message is now liked.
    pub fn toggle_like(&self, user_id: &str, message_id: &str) -> StoreResult<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    [user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if existing.is_some() {
                tx.execute(
                    "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    [user_id, message_id],
                )?;
                false
            } else {
                let inserted = tx
                    .execute(
                        "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                        [user_id, message_id],
                    )
                    .map_err(map_constraint);
                match inserted {
                    Ok(_) => true,
                    // Pair constraint hit despite the read: already liked,
                    // so this toggle unlikes instead.
                    Err(StoreError::Duplicate(_)) => {
                        tx.execute(
                            "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                            [user_id, message_id],
                        )?;
                        false
                    }
                    Err(e) => return Err(e),
                }
            };

            tx.commit()?;
            Ok(liked)
        })
    }

    /// Messages the user has liked, newest like first.
    pub fn likes_for_user(&self, user_id: &str) -> StoreResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, u.username, m.text, m.created_at
                 FROM likes l
                 JOIN messages m ON m.id = l.message_id
                 LEFT JOIN users u ON m.user_id = u.id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn likes_for_message(&self, message_id: &str) -> StoreResult<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, message_id FROM likes WHERE message_id = ?1",
            )?;
            let rows = stmt
                .query_map([message_id], |row| {
                    Ok(LikeRow {
                        user_id: row.get(0)?,
                        message_id: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn like_count_for_message(&self, message_id: &str) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE message_id = ?1",
                [message_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::{add_message, add_user, db};
    use crate::StoreError;

    #[test]
    fn one_like_per_user_per_message() {
        let db = db();
        let user = add_user(&db, "testuser");
        let msg = add_message(&db, &user, "test message");

        db.insert_like(&user, &msg).unwrap();

        let err = db.insert_like(&user, &msg).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("like")));

        // The first like's effects persist.
        assert_eq!(db.likes_for_message(&msg).unwrap().len(), 1);
    }

    #[test]
    fn toggle_like_inserts_then_removes() {
        let db = db();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let msg = add_message(&db, &author, "hello");

        assert!(db.toggle_like(&fan, &msg).unwrap());
        assert_eq!(db.likes_for_message(&msg).unwrap().len(), 1);

        assert!(!db.toggle_like(&fan, &msg).unwrap());
        assert!(db.likes_for_message(&msg).unwrap().is_empty());
    }

    #[test]
    fn toggle_recovers_from_constraint_hit() {
        let db = db();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");
        let msg = add_message(&db, &author, "hello");

        // Like exists from a raw insert; the toggle's fallback path must
        // land on "unlike", not surface the pair constraint.
        db.insert_like(&fan, &msg).unwrap();
        assert!(!db.toggle_like(&fan, &msg).unwrap());
        assert!(db.likes_for_message(&msg).unwrap().is_empty());
    }

    #[test]
    fn toggle_unknown_message_is_not_found() {
        let db = db();
        let user = add_user(&db, "testuser");
        assert!(matches!(
            db.toggle_like(&user, "no-such-message"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn likes_listing_spans_messages() {
        let db = db();
        let main = add_user(&db, "mainuser");
        let user1 = add_user(&db, "testuser1");
        let user2 = add_user(&db, "testuser2");
        let m1 = add_message(&db, &user1, "hello");
        let m2 = add_message(&db, &user2, "huzzah");

        db.toggle_like(&main, &m1).unwrap();
        db.toggle_like(&main, &m2).unwrap();

        let texts: Vec<_> = db
            .likes_for_user(&main)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(&"hello".to_string()));
        assert!(texts.contains(&"huzzah".to_string()));
    }
}
