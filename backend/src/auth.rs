use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

use crate::{
    error::ServiceError,
    models::{ErrorResponse, LoginResponse},
    services::UserService,
};

/// Claims
///
/// Payload of the HS256 tokens issued by `/login` and checked by the guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's numeric id, encoded as a decimal string.
    pub sub: String,
    /// Expiration Time (exp): seconds since the Unix epoch.
    pub exp: u64,
    /// Issued At (iat)
    pub iat: u64,
}

/// AuthUser
///
/// The authenticated identity of one request. Produced by the guard and handed to the
/// services by parameter; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// AuthError
///
/// Every way authentication can fail. All client-side failures are `401`; lookups that
/// fail inside the store are reported as `500` without detail.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("invalid token")]
    MalformedHeader,
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    Expired,
    #[error("unknown user")]
    UnknownUser,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("credential lookup failed")]
    Lookup(#[source] ServiceError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::InvalidToken
            | AuthError::Expired
            | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
            AuthError::Signing(_) | AuthError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "authentication backend failure");
            "internal server error".to_string()
        } else {
            tracing::debug!(reason = %self, "request rejected by auth guard");
            self.to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// TokenValidator
///
/// The credential validator contract: turn an opaque bearer token into an identity.
/// Implementations must not mutate stored state.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError>;
}

pub type ValidatorState = Arc<dyn TokenValidator>;

/// JwtAuthenticator
///
/// Issues and verifies HS256 JWTs. Verification also confirms the subject still exists,
/// so tokens of users removed after issuance are refused.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
    users: UserService,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, token_ttl_secs: u64, users: UserService) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
            users,
        }
    }

    /// Signs a token for `user_id`, valid for the configured lifetime.
    pub fn issue_token(&self, user_id: i64) -> Result<String, AuthError> {
        let now = unix_now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Signing)
    }

    /// login
    ///
    /// Resolves `username` and returns a freshly issued token for it.
    pub async fn login(&self, username: &str) -> Result<LoginResponse, AuthError> {
        let user = self
            .users
            .get_by_username(username)
            .await
            .map_err(AuthError::Lookup)?
            .ok_or(AuthError::UnknownUser)?;

        tracing::info!(user_id = user.id, "issued token");
        Ok(LoginResponse {
            token: self.issue_token(user.id)?,
        })
    }
}

#[async_trait]
impl TokenValidator for JwtAuthenticator {
    async fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let user_id: i64 = token_data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;

        // The token may outlive its user.
        let user = self.users.get_by_id(user_id).await.map_err(|e| match e {
            ServiceError::NotFound { .. } => AuthError::UnknownUser,
            other => AuthError::Lookup(other),
        })?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// bearer_token
///
/// Extracts the token from an `Authorization` header, which must be exactly
/// `"Bearer <token>"`: two parts separated by a single space.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    if value.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// require_auth
///
/// The authorization guard placed in front of every mutating route. It validates the
/// bearer token and attaches the resulting `AuthUser` to the request extensions. On any
/// failure the pipeline stops here and the handler never runs.
pub async fn require_auth(
    State(validator): State<ValidatorState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?.to_owned();
    let user = validator.validate_token(&token).await?;

    tracing::debug!(user_id = user.id, "request authenticated");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// AuthUser Extractor Implementation
///
/// Hands the identity to handlers as an ordinary argument. Behind `require_auth` it reads
/// the identity the guard attached; elsewhere it performs the same validation itself.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    ValidatorState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let validator = ValidatorState::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        validator.validate_token(token).await
    }
}
