use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use warbler_db::StoreError;
use warbler_db::models::{MessageRow, parse_timestamp};
use warbler_types::api::{MessageResponse, NewMessageRequest, ToggleLikeResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{CurrentUser, require_owner};

/// The author is always the session user; the request body carries text
/// only, so a forged author id cannot even be expressed.
pub async fn create_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<NewMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = Uuid::new_v4();

    // Run blocking DB work off the async runtime; echo the stored row so
    // the response timestamp matches what later reads return.
    let db = state.clone();
    let mid = message_id.to_string();
    let uid = current.id.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.create_message(&mid, &uid, &req.text)?;
        db.db.get_message(&mid)?.ok_or(StoreError::NotFound)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })??;

    Ok((StatusCode::CREATED, Json(to_response(row, 0))))
}

pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = message_id.to_string();
    let row = state.db.get_message(&id)?.ok_or(ApiError::NotFound)?;
    let likes = state.db.like_count_for_message(&id)?;

    Ok(Json(to_response(row, likes)))
}

/// Only the owner may delete. Non-owners and unknown ids get the same
/// uniform denial, leaking nothing about whether the message exists.
pub async fn destroy_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = message_id.to_string();

    let row = state.db.get_message(&id)?.ok_or(ApiError::Unauthorized)?;
    require_owner(&row.user_id, &current)?;

    state.db.delete_message(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Like if not yet liked, unlike otherwise.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let liked = state
        .db
        .toggle_like(&current.id.to_string(), &message_id.to_string())?;

    Ok(Json(ToggleLikeResponse { liked }))
}

fn to_response(row: MessageRow, likes: usize) -> MessageResponse {
    MessageResponse {
        id: row.id.parse().unwrap_or_default(),
        user_id: row.user_id.parse().unwrap_or_default(),
        author_username: row.author_username,
        text: row.text,
        created_at: parse_timestamp(&row.created_at),
        likes,
    }
}
