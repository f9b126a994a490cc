//! Resource services: the layer that enforces field rules, referential integrity and
//! ownership before delegating to the repositories.
//!
//! Mutating operations take the caller's `AuthUser` explicitly. Ownership is always
//! decided against the loaded resource's `author_id`, never its primary key.

pub mod comment;
pub mod post;
pub mod topic;
pub mod user;

pub use comment::CommentService;
pub use post::PostService;
pub use topic::TopicService;
pub use user::UserService;

use crate::{
    auth::AuthUser,
    error::{ServiceError, ServiceResult},
};

/// Fails with `Unauthorized` unless `identity` authored the resource. Resources whose
/// author was deleted (`None`) belong to nobody.
fn ensure_owner(
    identity: &AuthUser,
    author_id: Option<i64>,
    entity: &'static str,
    id: i64,
) -> ServiceResult<()> {
    if author_id == Some(identity.id) {
        return Ok(());
    }
    tracing::warn!(
        actor = identity.id,
        ?author_id,
        entity,
        id,
        "ownership check failed"
    );
    Err(ServiceError::Unauthorized)
}

/// The acting identity may only create content in its own name.
fn ensure_self(identity: &AuthUser, author_id: i64) -> ServiceResult<()> {
    if identity.id == author_id {
        return Ok(());
    }
    tracing::warn!(
        actor = identity.id,
        author_id,
        "attempt to write on behalf of another user"
    );
    Err(ServiceError::Unauthorized)
}
