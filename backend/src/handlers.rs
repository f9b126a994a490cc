use crate::{
    AppState,
    auth::{AuthError, AuthUser},
    error::ServiceError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{
        Comment, CreateCommentRequest, CreatePostRequest, CreateTopicRequest, CreateUserRequest,
        ErrorResponse, LoginRequest, LoginResponse, Post, SetPostTopicsRequest, Topic,
        UpdateCommentRequest, UpdatePostRequest, UpdateTopicRequest, User,
    },
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

// --- Filter Structs ---

/// PostFilter
///
/// Query parameters for GET /posts. With `topic_id` the listing is scoped to one topic.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct PostFilter {
    /// Only return posts tagged with this topic.
    pub topic_id: Option<i64>,
}

type ApiResult<T> = Result<T, ServiceError>;

// --- Auth & Users ---

/// login
///
/// [Public Route] Exchanges a username for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Unknown user", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    Ok(Json(state.auth.login(&payload.username).await?))
}

/// get_users
///
/// [Public Route] Lists every registered user in id order.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn get_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.get_all().await?))
}

/// get_user
///
/// [Public Route] Fetches one user by id.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_by_id(id).await?))
}

/// register_user
///
/// [Public Route] Creates a user. Usernames are unique.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 409, description = "Username taken", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// --- Posts ---

/// get_posts
///
/// [Public Route] Lists every post, or only those tagged with `topic_id`.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostFilter),
    responses((status = 200, description = "Posts", body = [Post]))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PostFilter>,
) -> ApiResult<Json<Vec<Post>>> {
    let posts = match filter.topic_id {
        Some(topic_id) => state.posts.get_by_topic(topic_id).await?,
        None => state.posts.get_all().await?,
    };
    Ok(Json(posts))
}

/// get_post
///
/// [Public Route] Fetches one post together with its topics.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.get_by_id(id).await?))
}

/// create_post
///
/// [Authenticated Route] `author_id` must match the caller.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = state.posts.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Owner-only; replaces title and content.
#[utoipa::path(
    patch,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 401, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.update(&user, id, payload).await?))
}

/// set_post_topics
///
/// [Authenticated Route] Owner-only; replaces the post's topic set.
#[utoipa::path(
    put,
    path = "/posts/{id}/topics",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = SetPostTopicsRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 400, description = "Unknown topic", body = ErrorResponse),
        (status = 401, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn set_post_topics(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<SetPostTopicsRequest>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.set_topics(&user, id, payload).await?))
}

/// delete_post
///
/// [Authenticated Route] Owner-only. Removes the post, its comments and its topic links.
/// A second delete of the same id is a `404`.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.posts.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// get_post_comments
///
/// [Public Route] Comments of one post, oldest first. `404` when the post does not exist.
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Post Not Found", body = ErrorResponse)
    )
)]
pub async fn get_post_comments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.get_by_post(id).await?))
}

/// get_post_topics
///
/// [Public Route] Topics a post is tagged with. `404` when the post does not exist.
#[utoipa::path(
    get,
    path = "/posts/{id}/topics",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Topics", body = [Topic]),
        (status = 404, description = "Post Not Found", body = ErrorResponse)
    )
)]
pub async fn get_post_topics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Topic>>> {
    Ok(Json(state.topics.get_by_post(id).await?))
}

// --- Comments ---

/// get_comments
///
/// [Public Route] Lists every comment.
#[utoipa::path(
    get,
    path = "/comments",
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_comments(State(state): State<AppState>) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.get_all().await?))
}

/// get_comment
///
/// [Public Route] Fetches one comment by id.
#[utoipa::path(
    get,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Found", body = Comment),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.comments.get_by_id(id).await?))
}

/// create_comment
///
/// [Authenticated Route] Adds a comment to an existing post. `author_id` must match the
/// caller and the content must not be blank.
#[utoipa::path(
    post,
    path = "/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state.comments.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// update_comment
///
/// [Authenticated Route] Owner-only; replaces the comment's content.
#[utoipa::path(
    patch,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 401, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.comments.update(&user, id, payload).await?))
}

/// delete_comment
///
/// [Authenticated Route] Owner-only.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.comments.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Topics ---

/// get_topics
///
/// [Public Route] Lists every topic.
#[utoipa::path(
    get,
    path = "/topics",
    responses((status = 200, description = "Topics", body = [Topic]))
)]
pub async fn get_topics(State(state): State<AppState>) -> ApiResult<Json<Vec<Topic>>> {
    Ok(Json(state.topics.get_all().await?))
}

/// get_topic
///
/// [Public Route] Fetches one topic by id.
#[utoipa::path(
    get,
    path = "/topics/{id}",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Found", body = Topic),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_topic(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Topic>> {
    Ok(Json(state.topics.get_by_id(id).await?))
}

/// create_topic
///
/// [Authenticated Route] Creates a topic. Names are trimmed and must be unique.
///
/// *Note*: topics have no owner, so any authenticated user may create one.
#[utoipa::path(
    post,
    path = "/topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Created", body = Topic),
        (status = 409, description = "Name taken", body = ErrorResponse)
    )
)]
pub async fn create_topic(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTopicRequest>,
) -> ApiResult<(StatusCode, Json<Topic>)> {
    let topic = state.topics.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// update_topic
///
/// [Authenticated Route] Renames a topic. Renaming to a name held by another topic is a `409`.
#[utoipa::path(
    patch,
    path = "/topics/{id}",
    params(("id" = i64, Path, description = "Topic ID")),
    request_body = UpdateTopicRequest,
    responses(
        (status = 200, description = "Renamed", body = Topic),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 409, description = "Name taken", body = ErrorResponse)
    )
)]
pub async fn update_topic(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateTopicRequest>,
) -> ApiResult<Json<Topic>> {
    Ok(Json(state.topics.update(&user, id, payload).await?))
}

/// delete_topic
///
/// [Authenticated Route] Deletes a topic and untags every post that carried it.
#[utoipa::path(
    delete,
    path = "/topics/{id}",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_topic(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.topics.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
