use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use warbler_db::Database;
use warbler_db::models::UserRow;
use warbler_types::api::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};

use crate::error::ApiError;
use crate::middleware::bearer_token;
use crate::session::SessionStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self {
            db,
            sessions: SessionStore::new(),
        })
    }
}

/// Create a user and open a session for them. Field validation and the
/// username/email uniqueness checks live in the store; nothing is persisted
/// when any of them fail.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // The store validates the stored credential; the raw password must be
    // checked here, before hashing turns empty input into a valid hash.
    if req.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    state.db.create_user(
        &user_id.to_string(),
        &req.username,
        &req.email,
        &password_hash,
        req.image_url.as_deref(),
    )?;

    let row = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(ApiError::Internal)?;

    let token = state.sessions.create(user_id);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: row.into_user(),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Any credential failure produces the same response.
    let row = authenticate(&state.db, &req.username, &req.password)?
        .ok_or(ApiError::Unauthorized)?;

    let user_id: Uuid = row.id.parse().map_err(|_| ApiError::Internal)?;
    let token = state.sessions.create(user_id);

    Ok(Json(LoginResponse {
        user_id,
        username: row.username,
        token,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // The middleware already vouched for this token; revoke may still miss
    // if a parallel logout won, which is fine.
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Credential check: the user row iff the username exists and the password
/// matches. Mismatches of any kind come back as `None`, never as an error.
pub fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, ApiError> {
    let Some(row) = db.get_user_by_username(username)? else {
        return Ok(None);
    };

    let Ok(parsed_hash) = PasswordHash::new(&row.password) else {
        return Ok(None);
    };

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(Some(row))
    } else {
        Ok(None)
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::Internal)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use warbler_db::Database;

    use super::{authenticate, hash_password};

    fn db_with_user(username: &str, password: &str) -> Database {
        let db = Database::open_in_memory().expect("in-memory database");
        let hash = hash_password(password).expect("hash");
        db.create_user(
            &Uuid::new_v4().to_string(),
            username,
            &format!("{username}@test.com"),
            &hash,
            None,
        )
        .expect("create user");
        db
    }

    #[test]
    fn authenticate_accepts_exact_match_only() {
        let db = db_with_user("testuser1", "password1");

        let user = authenticate(&db, "testuser1", "password1").unwrap();
        assert_eq!(user.unwrap().username, "testuser1");

        assert!(authenticate(&db, "WRONG_USER", "password1").unwrap().is_none());
        assert!(authenticate(&db, "testuser1", "WRONG_PASSWORD").unwrap().is_none());
        assert!(authenticate(&db, "", "WRONG_PASSWORD").unwrap().is_none());
        assert!(authenticate(&db, "testuser1", "").unwrap().is_none());
    }
}
