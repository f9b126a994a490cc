use crate::{
    error::{RepoError, RepoResult},
    models::{
        Comment, CreateCommentRequest, CreatePostRequest, CreateTopicRequest, CreateUserRequest,
        Post, PostTopic, Topic, UpdateCommentRequest, UpdatePostRequest, User,
    },
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};

// --- Repository Contracts ---
//
// One trait per entity. Services depend on these traits only, so the Postgres adapter
// can be swapped for an in-memory one in tests. Methods carry the entity in their name
// so a single struct can implement all four without ambiguity.

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_users(&self) -> RepoResult<Vec<User>>;
    /// Fails with `RepoError::NotFound` if absent.
    async fn get_user(&self, id: i64) -> RepoResult<User>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, req: &CreateUserRequest) -> RepoResult<User>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get_posts(&self) -> RepoResult<Vec<Post>>;
    async fn get_post(&self, id: i64) -> RepoResult<Post>;
    async fn get_posts_by_topic(&self, topic_id: i64) -> RepoResult<Vec<Post>>;
    async fn create_post(&self, req: &CreatePostRequest) -> RepoResult<Post>;
    async fn update_post(&self, id: i64, req: &UpdatePostRequest) -> RepoResult<Post>;
    /// Replaces every `post_topics` row of the post atomically.
    async fn set_post_topics(&self, id: i64, links: &[PostTopic]) -> RepoResult<Post>;
    async fn delete_post(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn get_comments(&self) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> RepoResult<Comment>;
    async fn get_comments_by_post(&self, post_id: i64) -> RepoResult<Vec<Comment>>;
    async fn create_comment(&self, req: &CreateCommentRequest) -> RepoResult<Comment>;
    async fn update_comment(&self, id: i64, req: &UpdateCommentRequest) -> RepoResult<Comment>;
    async fn delete_comment(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn get_topics(&self) -> RepoResult<Vec<Topic>>;
    async fn get_topic(&self, id: i64) -> RepoResult<Topic>;
    async fn get_topic_by_name(&self, name: &str) -> RepoResult<Option<Topic>>;
    async fn get_topics_by_post(&self, post_id: i64) -> RepoResult<Vec<Topic>>;
    async fn create_topic(&self, req: &CreateTopicRequest) -> RepoResult<Topic>;
    async fn update_topic(&self, id: i64, name: &str) -> RepoResult<Topic>;
    async fn delete_topic(&self, id: i64) -> RepoResult<()>;
}

pub type UserRepositoryState = Arc<dyn UserRepository>;
pub type PostRepositoryState = Arc<dyn PostRepository>;
pub type CommentRepositoryState = Arc<dyn CommentRepository>;
pub type TopicRepositoryState = Arc<dyn TopicRepository>;

/// PostgresRepository
///
/// The concrete implementation of every repository trait, backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the topics for each post in one round-trip and attaches them.
    async fn attach_topics(&self, mut posts: Vec<Post>) -> RepoResult<Vec<Post>> {
        if posts.is_empty() {
            return Ok(posts);
        }
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let rows = sqlx::query_as::<_, TaggedTopicRow>(
            r#"
            SELECT pt.post_id, t.id, t.name
            FROM post_topics pt
            JOIN topics t ON t.id = pt.topic_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<i64, Vec<Topic>> = HashMap::new();
        for row in rows {
            by_post.entry(row.post_id).or_default().push(Topic {
                id: row.id,
                name: row.name,
            });
        }
        for post in &mut posts {
            post.topics = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(posts)
    }

    async fn attach_topics_one(&self, post: Post) -> RepoResult<Post> {
        self.attach_topics(vec![post])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)
    }
}

#[derive(FromRow)]
struct TaggedTopicRow {
    post_id: i64,
    id: i64,
    name: String,
}

const POST_COLUMNS: &str = "id, title, content, created_at, updated_at, author_id";
const COMMENT_COLUMNS: &str = "id, content, created_at, updated_at, post_id, author_id";

fn affected_one(rows: u64) -> RepoResult<()> {
    if rows == 0 {
        Err(RepoError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn get_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, id: i64) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn create_user(&self, req: &CreateUserRequest) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username) VALUES ($1) RETURNING id, username",
        )
        .bind(&req.username)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn get_posts(&self) -> RepoResult<Vec<Post>> {
        let posts =
            sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        self.attach_topics(posts).await
    }

    async fn get_post(&self, id: i64) -> RepoResult<Post> {
        let post =
            sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        self.attach_topics_one(post).await
    }

    /// get_posts_by_topic
    ///
    /// Joins through `post_topics`; posts come back in ascending id order.
    async fn get_posts_by_topic(&self, topic_id: i64) -> RepoResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.created_at, p.updated_at, p.author_id
            FROM posts p
            JOIN post_topics pt ON pt.post_id = p.id
            WHERE pt.topic_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_topics(posts).await
    }

    async fn create_post(&self, req: &CreatePostRequest) -> RepoResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (title, content, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {POST_COLUMNS}"
        ))
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update_post(&self, id: i64, req: &UpdatePostRequest) -> RepoResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = $2, content = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)?;
        self.attach_topics_one(post).await
    }

    /// set_post_topics
    ///
    /// Replaces every join row of post `id` with `links` in one transaction. Links that
    /// name another post are ignored.
    async fn set_post_topics(&self, id: i64, links: &[PostTopic]) -> RepoResult<Post> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE posts SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        affected_one(touched.rows_affected())?;

        sqlx::query("DELETE FROM post_topics WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for link in links.iter().filter(|link| link.post_id == id) {
            sqlx::query(
                "INSERT INTO post_topics (post_id, topic_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(link.post_id)
            .bind(link.topic_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get_post(id).await
    }

    async fn delete_post(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        affected_one(result.rows_affected())
    }
}

#[async_trait]
impl CommentRepository for PostgresRepository {
    async fn get_comments(&self) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn get_comments_by_post(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at, id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn create_comment(&self, req: &CreateCommentRequest) -> RepoResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (content, post_id, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(&req.content)
        .bind(req.post_id)
        .bind(req.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, req: &UpdateCommentRequest) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments SET content = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        affected_one(result.rows_affected())
    }
}

#[async_trait]
impl TopicRepository for PostgresRepository {
    async fn get_topics(&self) -> RepoResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }

    async fn get_topic(&self, id: i64) -> RepoResult<Topic> {
        let topic = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn get_topic_by_name(&self, name: &str) -> RepoResult<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn get_topics_by_post(&self, post_id: i64) -> RepoResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT t.id, t.name
            FROM topics t
            JOIN post_topics pt ON pt.topic_id = t.id
            WHERE pt.post_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(topics)
    }

    async fn create_topic(&self, req: &CreateTopicRequest) -> RepoResult<Topic> {
        let topic = sqlx::query_as::<_, Topic>(
            "INSERT INTO topics (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&req.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(topic)
    }

    async fn update_topic(&self, id: i64, name: &str) -> RepoResult<Topic> {
        sqlx::query_as::<_, Topic>("UPDATE topics SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_topic(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        affected_one(result.rows_affected())
    }
}
