pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod session;
pub mod users;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

pub use auth::{AppState, AppStateInner};

/// Build the full route tree. Only signup and login are public; every other
/// route sits behind the session gate.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/{user_id}/likes", get(users::show_likes))
        .route(
            "/users/{user_id}/follow",
            post(users::add_follow).delete(users::stop_following),
        )
        .route("/messages", post(messages::create_message))
        .route(
            "/messages/{message_id}",
            get(messages::show_message).delete(messages::destroy_message),
        )
        .route("/messages/{message_id}/like", post(messages::toggle_like))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
