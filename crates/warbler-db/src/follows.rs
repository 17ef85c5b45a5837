//! Relationship graph: directed follow edges between users.
//!
//! A row (followed_id, follower_id) means follower follows followed.
//! Inserts are idempotent — following someone twice leaves one edge.

use rusqlite::OptionalExtension;

use crate::error::{StoreResult, map_constraint};
use crate::models::UserRow;
use crate::users::row_to_user;
use crate::Database;

impl Database {
    /// Record that `follower_id` follows `followed_id`. Idempotent.
    pub fn follow(&self, follower_id: &str, followed_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO follows (followed_id, follower_id) VALUES (?1, ?2)",
                [followed_id, follower_id],
            )
            .map_err(map_constraint)?;
            Ok(())
        })
    }

    /// Remove the edge if present; no-op when absent.
    pub fn unfollow(&self, follower_id: &str, followed_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM follows WHERE followed_id = ?1 AND follower_id = ?2",
                [followed_id, follower_id],
            )?;
            Ok(())
        })
    }

    /// True iff `a` follows `b`.
    pub fn is_following(&self, a: &str, b: &str) -> StoreResult<bool> {
        self.edge_exists(b, a)
    }

    /// True iff `b` follows `a`.
    pub fn is_followed_by(&self, a: &str, b: &str) -> StoreResult<bool> {
        self.edge_exists(a, b)
    }

    fn edge_exists(&self, followed_id: &str, follower_id: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let hit = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE followed_id = ?1 AND follower_id = ?2",
                    [followed_id, follower_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: &str) -> StoreResult<Vec<UserRow>> {
        self.query_edge_users(
            "SELECT u.id, u.username, u.email, u.password, u.image_url, u.created_at
             FROM follows f JOIN users u ON u.id = f.followed_id
             WHERE f.follower_id = ?1
             ORDER BY u.username",
            user_id,
        )
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: &str) -> StoreResult<Vec<UserRow>> {
        self.query_edge_users(
            "SELECT u.id, u.username, u.email, u.password, u.image_url, u.created_at
             FROM follows f JOIN users u ON u.id = f.follower_id
             WHERE f.followed_id = ?1
             ORDER BY u.username",
            user_id,
        )
    }

    fn query_edge_users(&self, sql: &str, user_id: &str) -> StoreResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([user_id], row_to_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::{add_user, db};
    use crate::StoreError;

    #[test]
    fn follow_direction_is_asymmetric() {
        let db = db();
        let user1 = add_user(&db, "testuser1");
        let user2 = add_user(&db, "testuser2");

        // user2 follows user1.
        db.follow(&user2, &user1).unwrap();

        assert!(!db.is_following(&user1, &user2).unwrap());
        assert!(db.is_following(&user2, &user1).unwrap());
        assert!(db.is_followed_by(&user1, &user2).unwrap());
        assert!(!db.is_followed_by(&user2, &user1).unwrap());
    }

    #[test]
    fn following_and_followers_lists() {
        let db = db();
        let main = add_user(&db, "mainuser");
        let user1 = add_user(&db, "testuser1");
        let user2 = add_user(&db, "testuser2");
        let user3 = add_user(&db, "testuser3");

        db.follow(&main, &user1).unwrap();
        db.follow(&main, &user2).unwrap();
        db.follow(&user1, &main).unwrap();

        let names: Vec<_> = db
            .following(&main)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["testuser1", "testuser2"]);

        let names: Vec<_> = db
            .followers(&main)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["testuser1"]);

        assert!(db.followers(&user3).unwrap().is_empty());
    }

    #[test]
    fn follow_is_idempotent() {
        let db = db();
        let a = add_user(&db, "a");
        let b = add_user(&db, "b");

        db.follow(&a, &b).unwrap();
        db.follow(&a, &b).unwrap();

        assert_eq!(db.following(&a).unwrap().len(), 1);
    }

    #[test]
    fn unfollow_removes_edge_and_tolerates_absence() {
        let db = db();
        let a = add_user(&db, "a");
        let b = add_user(&db, "b");

        db.follow(&a, &b).unwrap();
        db.unfollow(&a, &b).unwrap();
        assert!(!db.is_following(&a, &b).unwrap());

        // Absent edge: still Ok.
        db.unfollow(&a, &b).unwrap();
    }

    #[test]
    fn follow_unknown_user_is_not_found() {
        let db = db();
        let a = add_user(&db, "a");
        assert!(matches!(
            db.follow(&a, "no-such-user"),
            Err(StoreError::NotFound)
        ));
    }
}
