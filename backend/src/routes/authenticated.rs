use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{patch, post, put},
};

/// Authenticated Router Module
///
/// Every create/update/delete operation. The router returned here is wrapped in the
/// `require_auth` guard by `create_router`; handlers receive the resulting `AuthUser`
/// and pass it to the services, which perform the ownership checks.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /posts
        // `author_id` in the body must be the caller.
        .route("/posts", post(handlers::create_post))
        // PATCH/DELETE /posts/{id}
        // Author-only.
        .route(
            "/posts/{id}",
            patch(handlers::update_post).delete(handlers::delete_post),
        )
        // PUT /posts/{id}/topics
        // Replaces the full topic set of a post. Author-only.
        .route("/posts/{id}/topics", put(handlers::set_post_topics))
        .route("/comments", post(handlers::create_comment))
        .route(
            "/comments/{id}",
            patch(handlers::update_comment).delete(handlers::delete_comment),
        )
        // Topics have no owner; any authenticated user may manage them.
        .route("/topics", post(handlers::create_topic))
        .route(
            "/topics/{id}",
            patch(handlers::update_topic).delete(handlers::delete_topic),
        )
}
