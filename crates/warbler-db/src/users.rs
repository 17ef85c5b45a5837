//! Identity store: user records, uniqueness of username/email, lookup.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{StoreError, StoreResult, map_constraint};
use crate::models::UserRow;
use crate::Database;

impl Database {
    /// Persist a new user. Username, email and credential must be non-empty;
    /// username and email must be globally unique. Fails atomically — no
    /// partial row is visible on failure.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        image_url: Option<&str>,
    ) -> StoreResult<()> {
        if username.is_empty() {
            return Err(StoreError::validation("username must not be empty"));
        }
        if email.is_empty() {
            return Err(StoreError::validation("email must not be empty"));
        }
        if password_hash.is_empty() {
            return Err(StoreError::validation("password must not be empty"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, email, password_hash, image_url],
            )
            .map_err(map_constraint)?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// All users, or those whose username contains `q`, ordered by username.
    pub fn list_users(&self, q: Option<&str>) -> StoreResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, image_url, created_at
                 FROM users
                 WHERE ?1 IS NULL OR instr(username, ?1) > 0
                 ORDER BY username",
            )?;
            let rows = stmt
                .query_map([q], row_to_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Remove a user and everything hanging off them: their messages, likes
    /// they gave, likes on their messages, and follow edges on either side.
    /// All-or-nothing inside one transaction.
    pub fn delete_user(&self, id: &str) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM likes WHERE user_id = ?1
                 OR message_id IN (SELECT id FROM messages WHERE user_id = ?1)",
                [id],
            )?;
            tx.execute(
                "DELETE FROM follows WHERE followed_id = ?1 OR follower_id = ?1",
                [id],
            )?;
            tx.execute("DELETE FROM messages WHERE user_id = ?1", [id])?;
            let removed = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(StoreError::NotFound);
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> StoreResult<Option<UserRow>> {
    // `column` is a compile-time constant, never caller input.
    let sql = format!(
        "SELECT id, username, email, password, image_url, created_at
         FROM users WHERE {column} = ?1"
    );
    let row = conn
        .query_row(&sql, [value], row_to_user)
        .optional()?;
    Ok(row)
}

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_util::{add_user, db};
    use crate::StoreError;

    #[test]
    fn create_and_fetch_user() {
        let db = db();
        let id = add_user(&db, "testuser");

        let row = db.get_user_by_username("testuser").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.email, "testuser@test.com");

        // A fresh user has no messages and no followers.
        assert!(db.messages_for_user(&id).unwrap().is_empty());
        assert!(db.followers(&id).unwrap().is_empty());
    }

    #[test]
    fn signup_requirements() {
        let db = db();
        add_user(&db, "testuser1");

        // Repeat email.
        let err = db
            .create_user("u2", "testuser2", "testuser1@test.com", "HASHED", None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));

        // Repeat username.
        let err = db
            .create_user("u3", "testuser1", "test3@test.com", "HASHED", None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));

        // Empty username, email, password.
        assert!(matches!(
            db.create_user("u4", "", "test4@test.com", "HASHED", None),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_user("u5", "testuser5", "", "HASHED", None),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_user("u6", "testuser6", "test6@test.com", "", None),
            Err(StoreError::Validation(_))
        ));

        // The first user is the only one that was made.
        assert_eq!(db.list_users(None).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_signup_leaves_first_user_intact() {
        let db = db();
        let id = add_user(&db, "testuser");

        let err = db
            .create_user("other", "testuser", "other@test.com", "OTHER", None)
            .unwrap_err();
        assert!(err.is_duplicate());

        let row = db.get_user_by_username("testuser").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.password, "HASHED_PASSWORD");
    }

    #[test]
    fn search_users_by_username() {
        let db = db();
        add_user(&db, "testuser1");
        add_user(&db, "testuser2");
        add_user(&db, "someoneelse");

        let all = db.list_users(None).unwrap();
        assert_eq!(all.len(), 3);

        let hits = db.list_users(Some("testuser")).unwrap();
        let names: Vec<_> = hits.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["testuser1", "testuser2"]);
    }

    #[test]
    fn delete_user_cascades() {
        let db = db();
        let author = add_user(&db, "author");
        let fan = add_user(&db, "fan");

        let msg = crate::test_util::add_message(&db, &author, "test message");
        db.follow(&fan, &author).unwrap();
        db.toggle_like(&fan, &msg).unwrap();

        db.delete_user(&author).unwrap();

        assert!(db.get_user_by_id(&author).unwrap().is_none());
        assert!(db.get_message(&msg).unwrap().is_none());
        assert!(db.likes_for_user(&fan).unwrap().is_empty());
        assert!(db.following(&fan).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_user_is_not_found() {
        let db = db();
        assert!(matches!(db.delete_user("nope"), Err(StoreError::NotFound)));
    }
}
