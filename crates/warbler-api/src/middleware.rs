//! The session/authorization gate. Every protected route passes through
//! [`require_auth`]; owner-scoped mutations additionally call
//! [`require_owner`] before touching the store.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiError;

/// The acting identity for a request, resolved from the session store.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// Resolve the session token into a `CurrentUser` extension, or reject with
/// the uniform unauthorized response. A token whose user has since been
/// deleted is rejected the same way.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthorized)?;

    let user_id = state.sessions.resolve(token).ok_or_else(|| {
        debug!("rejected request with unknown session token");
        ApiError::Unauthorized
    })?;

    let row = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser {
        id: user_id,
        username: row.username,
    });
    Ok(next.run(req).await)
}

/// Ownership gate: the acting user must own the resource. Failure is the
/// same `Unauthorized` the login gate produces, so a caller cannot tell a
/// foreign resource from a missing session.
pub fn require_owner(resource_owner_id: &str, current: &CurrentUser) -> Result<(), ApiError> {
    if resource_owner_id == current.id.to_string() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
