use crate::{
    auth::AuthUser,
    error::{RepoError, ServiceError, ServiceResult},
    models::{CreateTopicRequest, Topic, UpdateTopicRequest},
    repository::{PostRepositoryState, TopicRepositoryState},
    validation::require_non_blank,
};

/// TopicService
///
/// Topics have no author: any authenticated identity may create, rename or delete them.
#[derive(Clone)]
pub struct TopicService {
    topics: TopicRepositoryState,
    posts: PostRepositoryState,
}

fn name_collision(err: RepoError) -> ServiceError {
    match err {
        RepoError::UniqueViolation(_) => ServiceError::AlreadyInUse { field: "name" },
        other => ServiceError::Internal(other),
    }
}

impl TopicService {
    pub fn new(topics: TopicRepositoryState, posts: PostRepositoryState) -> Self {
        Self { topics, posts }
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<Topic>> {
        Ok(self.topics.get_topics().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Topic> {
        self.topics
            .get_topic(id)
            .await
            .map_err(ServiceError::lookup("topic", id))
    }

    pub async fn get_by_post(&self, post_id: i64) -> ServiceResult<Vec<Topic>> {
        self.posts
            .get_post(post_id)
            .await
            .map_err(ServiceError::lookup("post", post_id))?;
        Ok(self.topics.get_topics_by_post(post_id).await?)
    }

    /// create
    ///
    /// Names are stored trimmed and must be unique; a duplicate fails with
    /// `AlreadyInUse { field: "name" }` instead of overwriting.
    pub async fn create(&self, identity: &AuthUser, req: CreateTopicRequest) -> ServiceResult<Topic> {
        require_non_blank("name", &req.name)?;
        let req = CreateTopicRequest {
            name: req.name.trim().to_string(),
        };

        if self.topics.get_topic_by_name(&req.name).await?.is_some() {
            return Err(ServiceError::AlreadyInUse { field: "name" });
        }

        let topic = self.topics.create_topic(&req).await.map_err(name_collision)?;
        tracing::info!(topic_id = topic.id, actor = identity.id, "topic created");
        Ok(topic)
    }

    pub async fn update(
        &self,
        identity: &AuthUser,
        id: i64,
        req: UpdateTopicRequest,
    ) -> ServiceResult<Topic> {
        self.get_by_id(id).await?;
        require_non_blank("name", &req.name)?;
        let name = req.name.trim();

        if let Some(other) = self.topics.get_topic_by_name(name).await? {
            if other.id != id {
                return Err(ServiceError::AlreadyInUse { field: "name" });
            }
        }

        let topic = self
            .topics
            .update_topic(id, name)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => ServiceError::NotFound { entity: "topic", id },
                other => name_collision(other),
            })?;
        tracing::info!(topic_id = id, actor = identity.id, "topic renamed");
        Ok(topic)
    }

    pub async fn delete(&self, identity: &AuthUser, id: i64) -> ServiceResult<()> {
        self.get_by_id(id).await?;
        self.topics
            .delete_topic(id)
            .await
            .map_err(ServiceError::lookup("topic", id))?;
        tracing::info!(topic_id = id, actor = identity.id, "topic deleted");
        Ok(())
    }
}
