use super::{ensure_owner, ensure_self};
use crate::{
    auth::AuthUser,
    error::{RepoError, ServiceError, ServiceResult},
    models::{CreatePostRequest, Post, PostTopic, SetPostTopicsRequest, UpdatePostRequest},
    repository::{PostRepositoryState, TopicRepositoryState, UserRepositoryState},
    validation::validate_post_fields,
};

/// PostService
///
/// CRUD for posts plus management of their topic set.
#[derive(Clone)]
pub struct PostService {
    posts: PostRepositoryState,
    users: UserRepositoryState,
    topics: TopicRepositoryState,
}

impl PostService {
    pub fn new(
        posts: PostRepositoryState,
        users: UserRepositoryState,
        topics: TopicRepositoryState,
    ) -> Self {
        Self {
            posts,
            users,
            topics,
        }
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<Post>> {
        Ok(self.posts.get_posts().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Post> {
        self.posts
            .get_post(id)
            .await
            .map_err(ServiceError::lookup("post", id))
    }

    /// Posts tagged with `topic_id`, in storage order. Unknown topics yield an empty list.
    pub async fn get_by_topic(&self, topic_id: i64) -> ServiceResult<Vec<Post>> {
        Ok(self.posts.get_posts_by_topic(topic_id).await?)
    }

    /// create
    ///
    /// The identity must be the declared author, the fields must pass validation, and
    /// the author must exist. The author lookup is an explicit round-trip so a missing
    /// user surfaces as a validation error rather than a foreign-key failure.
    pub async fn create(&self, identity: &AuthUser, req: CreatePostRequest) -> ServiceResult<Post> {
        ensure_self(identity, req.author_id)?;
        validate_post_fields(&req.title, &req.content)?;

        self.users.get_user(req.author_id).await.map_err(|e| match e {
            RepoError::NotFound => {
                ServiceError::validation(format!("no author with ID {}", req.author_id))
            }
            other => ServiceError::Internal(other),
        })?;

        let post = self.posts.create_post(&req).await?;
        tracing::info!(post_id = post.id, author_id = req.author_id, "post created");
        Ok(post)
    }

    /// update
    ///
    /// Replaces title and content. Fails with `NotFound` for unknown ids and
    /// `Unauthorized` when the caller is not the author; the post is left untouched.
    pub async fn update(
        &self,
        identity: &AuthUser,
        id: i64,
        req: UpdatePostRequest,
    ) -> ServiceResult<Post> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(identity, existing.author_id, "post", id)?;
        validate_post_fields(&req.title, &req.content)?;

        let post = self
            .posts
            .update_post(id, &req)
            .await
            .map_err(ServiceError::lookup("post", id))?;
        tracing::info!(post_id = id, "post updated");
        Ok(post)
    }

    /// set_topics
    ///
    /// Replaces the post's topic set. Duplicate ids collapse to one join row; every
    /// referenced topic must exist.
    pub async fn set_topics(
        &self,
        identity: &AuthUser,
        id: i64,
        req: SetPostTopicsRequest,
    ) -> ServiceResult<Post> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(identity, existing.author_id, "post", id)?;

        let mut links: Vec<PostTopic> = Vec::with_capacity(req.topic_ids.len());
        for topic_id in req.topic_ids {
            let link = PostTopic {
                post_id: id,
                topic_id,
            };
            if !links.contains(&link) {
                links.push(link);
            }
        }

        for link in &links {
            self.topics.get_topic(link.topic_id).await.map_err(|e| match e {
                RepoError::NotFound => {
                    ServiceError::validation(format!("no topic with ID {}", link.topic_id))
                }
                other => ServiceError::Internal(other),
            })?;
        }

        let post = self
            .posts
            .set_post_topics(id, &links)
            .await
            .map_err(ServiceError::lookup("post", id))?;
        tracing::info!(post_id = id, topics = links.len(), "post topics replaced");
        Ok(post)
    }

    /// delete
    ///
    /// Not idempotent: a second delete of the same id fails with `NotFound`.
    pub async fn delete(&self, identity: &AuthUser, id: i64) -> ServiceResult<()> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(identity, existing.author_id, "post", id)?;

        self.posts
            .delete_post(id)
            .await
            .map_err(ServiceError::lookup("post", id))?;
        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }
}
