use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use warbler_types::api::UserProfileResponse;
use warbler_types::models::{Message, User};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_users(query.q.as_deref())?;
    let users: Vec<User> = rows.into_iter().map(|row| row.into_user()).collect();
    Ok(Json(users))
}

/// Profile: the user, their messages (newest first), and edge counts.
pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = user_id.to_string();
    let row = state.db.get_user_by_id(&id)?.ok_or(ApiError::NotFound)?;

    let messages: Vec<Message> = state
        .db
        .messages_for_user(&id)?
        .into_iter()
        .map(|m| m.into_message())
        .collect();
    let following = state.db.following(&id)?.len();
    let followers = state.db.followers(&id)?.len();

    Ok(Json(UserProfileResponse {
        user: row.into_user(),
        messages,
        following,
        followers,
    }))
}

pub async fn show_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = user_id.to_string();
    state.db.get_user_by_id(&id)?.ok_or(ApiError::NotFound)?;

    let users: Vec<User> = state
        .db
        .following(&id)?
        .into_iter()
        .map(|row| row.into_user())
        .collect();
    Ok(Json(users))
}

pub async fn show_followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = user_id.to_string();
    state.db.get_user_by_id(&id)?.ok_or(ApiError::NotFound)?;

    let users: Vec<User> = state
        .db
        .followers(&id)?
        .into_iter()
        .map(|row| row.into_user())
        .collect();
    Ok(Json(users))
}

pub async fn show_likes(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = user_id.to_string();
    state.db.get_user_by_id(&id)?.ok_or(ApiError::NotFound)?;

    let messages: Vec<Message> = state
        .db
        .likes_for_user(&id)?
        .into_iter()
        .map(|m| m.into_message())
        .collect();
    Ok(Json(messages))
}

/// The acting user starts following `user_id`.
pub async fn add_follow(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == current.id {
        return Err(ApiError::Validation("cannot follow yourself".into()));
    }

    state
        .db
        .follow(&current.id.to_string(), &user_id.to_string())?;
    Ok(Json(serde_json::json!({ "following": true })))
}

pub async fn stop_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .unfollow(&current.id.to_string(), &user_id.to_string())?;
    Ok(Json(serde_json::json!({ "following": false })))
}
