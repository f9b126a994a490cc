use crate::{
    error::{RepoError, ServiceError, ServiceResult},
    models::{CreateUserRequest, User},
    repository::UserRepositoryState,
    validation::require_non_blank,
};

/// UserService
///
/// Registration and lookup. Users are immutable once created.
#[derive(Clone)]
pub struct UserService {
    users: UserRepositoryState,
}

impl UserService {
    pub fn new(users: UserRepositoryState) -> Self {
        Self { users }
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.get_users().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<User> {
        self.users
            .get_user(id)
            .await
            .map_err(ServiceError::lookup("user", id))
    }

    pub async fn get_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self.users.get_user_by_username(username.trim()).await?)
    }

    /// create
    ///
    /// Registers a new username. Duplicates fail with `AlreadyInUse { field: "username" }`,
    /// whether caught by the pre-check or by the unique index in a race.
    pub async fn create(&self, req: CreateUserRequest) -> ServiceResult<User> {
        require_non_blank("username", &req.username)?;
        let req = CreateUserRequest {
            username: req.username.trim().to_string(),
        };

        if self.users.get_user_by_username(&req.username).await?.is_some() {
            return Err(ServiceError::AlreadyInUse { field: "username" });
        }

        let user = self.users.create_user(&req).await.map_err(|e| match e {
            RepoError::UniqueViolation(_) => ServiceError::AlreadyInUse { field: "username" },
            other => ServiceError::Internal(other),
        })?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }
}
