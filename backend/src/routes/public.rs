use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to anonymous clients: every read, plus the two entry points into
/// the identity flow (registration and login).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /login
        // Exchanges a username for a bearer token.
        .route("/login", post(handlers::login))
        // GET/POST /users
        .route("/users", get(handlers::get_users).post(handlers::register_user))
        .route("/users/{id}", get(handlers::get_user))
        // GET /posts?topic_id=...
        // With `topic_id` only posts tagged with that topic are returned.
        .route("/posts", get(handlers::get_posts))
        .route("/posts/{id}", get(handlers::get_post))
        .route("/posts/{id}/comments", get(handlers::get_post_comments))
        .route("/posts/{id}/topics", get(handlers::get_post_topics))
        .route("/comments", get(handlers::get_comments))
        .route("/comments/{id}", get(handlers::get_comment))
        .route("/topics", get(handlers::get_topics))
        .route("/topics/{id}", get(handlers::get_topic))
}
