use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Credential validation and the request guard.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

// Route table, split by access level (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::{AuthUser, JwtAuthenticator, TokenValidator, ValidatorState};
pub use config::AppConfig;
pub use error::{RepoError, ServiceError};
pub use repository::{
    CommentRepository, PostRepository, PostgresRepository, TopicRepository, UserRepository,
};
pub use services::{CommentService, PostService, TopicService, UserService};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::get_users, handlers::get_user, handlers::register_user,
        handlers::get_posts, handlers::get_post, handlers::create_post, handlers::update_post,
        handlers::set_post_topics, handlers::delete_post, handlers::get_post_comments,
        handlers::get_post_topics, handlers::get_comments, handlers::get_comment,
        handlers::create_comment, handlers::update_comment, handlers::delete_comment,
        handlers::get_topics, handlers::get_topic, handlers::create_topic,
        handlers::update_topic, handlers::delete_topic
    ),
    components(
        schemas(
            models::User, models::Post, models::Comment, models::Topic,
            models::CreateUserRequest, models::LoginRequest, models::LoginResponse,
            models::CreatePostRequest, models::UpdatePostRequest, models::SetPostTopicsRequest,
            models::CreateCommentRequest, models::UpdateCommentRequest,
            models::CreateTopicRequest, models::UpdateTopicRequest, models::ErrorResponse,
        )
    ),
    tags(
        (name = "forum-api", description = "Forum posts, comments and topics")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the resource services and the token authenticator.
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub topics: TopicService,
    /// Issues tokens on login and validates them in the guard.
    pub auth: Arc<JwtAuthenticator>,
}

impl AppState {
    /// new
    ///
    /// Wires every service to one repository value implementing all four entity
    /// contracts (Postgres in production, an in-memory store in tests). Only the token
    /// settings of `config` are kept.
    pub fn new<R>(repo: Arc<R>, config: &AppConfig) -> Self
    where
        R: UserRepository + PostRepository + CommentRepository + TopicRepository + 'static,
    {
        let users: Arc<dyn UserRepository> = repo.clone();
        let posts: Arc<dyn PostRepository> = repo.clone();
        let comments: Arc<dyn CommentRepository> = repo.clone();
        let topics: Arc<dyn TopicRepository> = repo;

        let user_service = UserService::new(users.clone());

        Self {
            posts: PostService::new(posts.clone(), users.clone(), topics.clone()),
            comments: CommentService::new(comments, posts.clone(), users),
            topics: TopicService::new(topics, posts),
            auth: Arc::new(JwtAuthenticator::new(
                &config.jwt_secret,
                config.token_ttl_secs,
                user_service.clone(),
            )),
            users: user_service,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for ValidatorState {
    fn from_ref(app_state: &AppState) -> ValidatorState {
        app_state.auth.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the authentication guard to the mutating
/// routes and wraps everything in the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Guarded routes: a request that fails authentication never reaches a handler.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with the `x-request-id` so every log line of the
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
