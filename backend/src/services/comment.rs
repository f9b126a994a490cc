use super::{ensure_owner, ensure_self};
use crate::{
    auth::AuthUser,
    error::{RepoError, ServiceError, ServiceResult},
    models::{Comment, CreateCommentRequest, UpdateCommentRequest},
    repository::{CommentRepositoryState, PostRepositoryState, UserRepositoryState},
    validation::require_non_blank,
};

/// CommentService
#[derive(Clone)]
pub struct CommentService {
    comments: CommentRepositoryState,
    posts: PostRepositoryState,
    users: UserRepositoryState,
}

impl CommentService {
    pub fn new(
        comments: CommentRepositoryState,
        posts: PostRepositoryState,
        users: UserRepositoryState,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
        }
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<Comment>> {
        Ok(self.comments.get_comments().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Comment> {
        self.comments
            .get_comment(id)
            .await
            .map_err(ServiceError::lookup("comment", id))
    }

    /// Comments of one post, oldest first. The post itself must exist.
    pub async fn get_by_post(&self, post_id: i64) -> ServiceResult<Vec<Comment>> {
        self.posts
            .get_post(post_id)
            .await
            .map_err(ServiceError::lookup("post", post_id))?;
        Ok(self.comments.get_comments_by_post(post_id).await?)
    }

    pub async fn create(
        &self,
        identity: &AuthUser,
        req: CreateCommentRequest,
    ) -> ServiceResult<Comment> {
        ensure_self(identity, req.author_id)?;
        require_non_blank("content", &req.content)?;

        self.posts.get_post(req.post_id).await.map_err(|e| match e {
            RepoError::NotFound => {
                ServiceError::validation(format!("no post with ID {}", req.post_id))
            }
            other => ServiceError::Internal(other),
        })?;
        self.users.get_user(req.author_id).await.map_err(|e| match e {
            RepoError::NotFound => {
                ServiceError::validation(format!("no author with ID {}", req.author_id))
            }
            other => ServiceError::Internal(other),
        })?;

        let comment = self.comments.create_comment(&req).await?;
        tracing::info!(
            comment_id = comment.id,
            post_id = req.post_id,
            "comment created"
        );
        Ok(comment)
    }

    pub async fn update(
        &self,
        identity: &AuthUser,
        id: i64,
        req: UpdateCommentRequest,
    ) -> ServiceResult<Comment> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(identity, existing.author_id, "comment", id)?;
        require_non_blank("content", &req.content)?;

        let comment = self
            .comments
            .update_comment(id, &req)
            .await
            .map_err(ServiceError::lookup("comment", id))?;
        tracing::info!(comment_id = id, "comment updated");
        Ok(comment)
    }

    pub async fn delete(&self, identity: &AuthUser, id: i64) -> ServiceResult<()> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(identity, existing.author_id, "comment", id)?;

        self.comments
            .delete_comment(id)
            .await
            .map_err(ServiceError::lookup("comment", id))?;
        tracing::info!(comment_id = id, "comment deleted");
        Ok(())
    }
}
