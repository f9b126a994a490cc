use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A forum member, stored in the `users` table. Usernames are unique and users are
/// immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Post
///
/// A forum post from the `posts` table together with the topics it is tagged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // Becomes NULL when the author row is deleted (ON DELETE SET NULL).
    pub author_id: Option<i64>,

    /// Loaded from `post_topics` by the repository, not a column of `posts`.
    #[sqlx(skip)]
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// Comment
///
/// A comment from the `comments` table. Removed together with its post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: Option<i64>,
}

/// Topic
///
/// A tag that can be attached to any number of posts. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

/// PostTopic
///
/// One row of the `post_topics` join table. The composite primary key
/// `(post_id, topic_id)` rules out duplicate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow, Default)]
pub struct PostTopic {
    pub post_id: i64,
    pub topic_id: i64,
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Input payload for registration (POST /users).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
}

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
}

/// LoginResponse
///
/// The bearer token to present as `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
}

/// CreatePostRequest
///
/// Input payload for POST /posts. `author_id` must be the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    #[schema(example = "At least ten characters of content.")]
    pub content: String,
    pub author_id: i64,
}

/// UpdatePostRequest
///
/// Input payload for PATCH /posts/{id}. Both fields are always supplied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

/// SetPostTopicsRequest
///
/// Replaces the full topic set of a post (PUT /posts/{id}/topics).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SetPostTopicsRequest {
    pub topic_ids: Vec<i64>,
}

/// CreateCommentRequest
///
/// Input payload for POST /comments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
}

/// UpdateCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// CreateTopicRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTopicRequest {
    pub name: String,
}

/// UpdateTopicRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTopicRequest {
    pub name: String,
}

// --- Output Schemas ---

/// ErrorResponse
///
/// Body of every non-2xx response: a single human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
