use uuid::Uuid;

use crate::Database;

pub fn db() -> Database {
    Database::open_in_memory().expect("in-memory database")
}

/// Insert a user with a derived email and a fixed placeholder credential.
pub fn add_user(db: &Database, username: &str) -> String {
    let id = Uuid::new_v4().to_string();
    let email = format!("{username}@test.com");
    db.create_user(&id, username, &email, "HASHED_PASSWORD", None)
        .expect("create user");
    id
}

pub fn add_message(db: &Database, user_id: &str, text: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.create_message(&id, user_id, text).expect("create message");
    id
}
