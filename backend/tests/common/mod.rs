#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use forum_api::{
    AppState, AuthUser,
    config::AppConfig,
    error::{RepoError, RepoResult},
    models::{
        Comment, CreateCommentRequest, CreatePostRequest, CreateTopicRequest, CreateUserRequest,
        Post, PostTopic, Topic, UpdateCommentRequest, UpdatePostRequest, User,
    },
    repository::{CommentRepository, PostRepository, TopicRepository, UserRepository},
};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

// --- In-Memory Repository ---

/// Implements every repository contract over plain maps, mirroring the Postgres
/// adapter's semantics: unique usernames/topic names, not-found on missing rows,
/// set-null/cascade on delete and de-duplicated join rows.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<Store>,
    /// Number of repository calls of any kind.
    pub calls: AtomicUsize,
    /// Number of write calls (create/update/delete/set).
    pub writes: AtomicUsize,
    /// When set, lookups by username or topic name find nothing, so a duplicate only
    /// surfaces as the unique-constraint failure of the write (a lost race).
    stale_name_lookups: AtomicBool,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    topics: BTreeMap<i64, Topic>,
    post_topics: Vec<PostTopic>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_topics(&self, post: &Post) -> Post {
        let mut post = post.clone();
        post.topics = self
            .post_topics
            .iter()
            .filter(|pt| pt.post_id == post.id)
            .filter_map(|pt| self.topics.get(&pt.topic_id).cloned())
            .collect();
        post.topics.sort_by_key(|t| t.id);
        post
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::MutexGuard<'_, Store> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap()
    }

    fn write(&self) -> std::sync::MutexGuard<'_, Store> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.read()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn make_name_lookups_stale(&self) {
        self.stale_name_lookups.store(true, Ordering::SeqCst);
    }

    fn names_stale(&self) -> bool {
        self.stale_name_lookups.load(Ordering::SeqCst)
    }

    // --- Seeding helpers (bypass counters) ---

    pub fn seed_user(&self, username: &str) -> User {
        let mut store = self.state.lock().unwrap();
        let id = store.next_id();
        let user = User {
            id,
            username: username.to_string(),
        };
        store.users.insert(id, user.clone());
        user
    }

    pub fn seed_post(&self, author_id: i64, title: &str, content: &str) -> Post {
        let mut store = self.state.lock().unwrap();
        let id = store.next_id();
        let now = Utc::now();
        let post = Post {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            author_id: Some(author_id),
            topics: vec![],
        };
        store.posts.insert(id, post.clone());
        post
    }

    pub fn seed_topic(&self, name: &str) -> Topic {
        let mut store = self.state.lock().unwrap();
        let id = store.next_id();
        let topic = Topic {
            id,
            name: name.to_string(),
        };
        store.topics.insert(id, topic.clone());
        topic
    }

    pub fn seed_comment(&self, post_id: i64, author_id: i64, content: &str) -> Comment {
        let mut store = self.state.lock().unwrap();
        let id = store.next_id();
        let now = Utc::now();
        let comment = Comment {
            id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            post_id,
            author_id: Some(author_id),
        };
        store.comments.insert(id, comment.clone());
        comment
    }

    pub fn tag(&self, post_id: i64, topic_id: i64) {
        let mut store = self.state.lock().unwrap();
        let pair = PostTopic { post_id, topic_id };
        if !store.post_topics.contains(&pair) {
            store.post_topics.push(pair);
        }
    }

    /// Deletes a user the way Postgres would: authored rows keep existing with a NULL author.
    pub fn remove_user(&self, id: i64) {
        let mut store = self.state.lock().unwrap();
        store.users.remove(&id);
        for post in store.posts.values_mut() {
            if post.author_id == Some(id) {
                post.author_id = None;
            }
        }
        for comment in store.comments.values_mut() {
            if comment.author_id == Some(id) {
                comment.author_id = None;
            }
        }
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        let store = self.state.lock().unwrap();
        store.posts.get(&id).map(|p| store.with_topics(p))
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn join_rows(&self, post_id: i64) -> Vec<PostTopic> {
        let store = self.state.lock().unwrap();
        store
            .post_topics
            .iter()
            .filter(|pt| pt.post_id == post_id)
            .copied()
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.read().users.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> RepoResult<User> {
        self.read().users.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        if self.names_stale() {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Ok(None);
        }
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, req: &CreateUserRequest) -> RepoResult<User> {
        let mut store = self.write();
        if store.users.values().any(|u| u.username == req.username) {
            return Err(RepoError::UniqueViolation("users_username_key".to_string()));
        }
        let id = store.next_id();
        let user = User {
            id,
            username: req.username.clone(),
        };
        store.users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn get_posts(&self) -> RepoResult<Vec<Post>> {
        let store = self.read();
        Ok(store.posts.values().map(|p| store.with_topics(p)).collect())
    }

    async fn get_post(&self, id: i64) -> RepoResult<Post> {
        let store = self.read();
        store
            .posts
            .get(&id)
            .map(|p| store.with_topics(p))
            .ok_or(RepoError::NotFound)
    }

    async fn get_posts_by_topic(&self, topic_id: i64) -> RepoResult<Vec<Post>> {
        let store = self.read();
        Ok(store
            .posts
            .values()
            .filter(|p| {
                store
                    .post_topics
                    .iter()
                    .any(|pt| pt.post_id == p.id && pt.topic_id == topic_id)
            })
            .map(|p| store.with_topics(p))
            .collect())
    }

    async fn create_post(&self, req: &CreatePostRequest) -> RepoResult<Post> {
        let mut store = self.write();
        let id = store.next_id();
        let now = Utc::now();
        let post = Post {
            id,
            title: req.title.clone(),
            content: req.content.clone(),
            created_at: now,
            updated_at: now,
            author_id: Some(req.author_id),
            topics: vec![],
        };
        store.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, req: &UpdatePostRequest) -> RepoResult<Post> {
        let mut store = self.write();
        let post = store.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.title = req.title.clone();
        post.content = req.content.clone();
        post.updated_at = Utc::now();
        let post = post.clone();
        Ok(store.with_topics(&post))
    }

    async fn set_post_topics(&self, id: i64, links: &[PostTopic]) -> RepoResult<Post> {
        let mut store = self.write();
        if !store.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        store.post_topics.retain(|pt| pt.post_id != id);
        for link in links.iter().filter(|link| link.post_id == id) {
            if !store.post_topics.contains(link) {
                store.post_topics.push(*link);
            }
        }
        let post = store.posts.get(&id).cloned().ok_or(RepoError::NotFound)?;
        Ok(store.with_topics(&post))
    }

    async fn delete_post(&self, id: i64) -> RepoResult<()> {
        let mut store = self.write();
        store.posts.remove(&id).ok_or(RepoError::NotFound)?;
        store.post_topics.retain(|pt| pt.post_id != id);
        store.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository {
    async fn get_comments(&self) -> RepoResult<Vec<Comment>> {
        Ok(self.read().comments.values().cloned().collect())
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Comment> {
        self.read()
            .comments
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_comments_by_post(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        Ok(self
            .read()
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, req: &CreateCommentRequest) -> RepoResult<Comment> {
        let mut store = self.write();
        let id = store.next_id();
        let now = Utc::now();
        let comment = Comment {
            id,
            content: req.content.clone(),
            created_at: now,
            updated_at: now,
            post_id: req.post_id,
            author_id: Some(req.author_id),
        };
        store.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, req: &UpdateCommentRequest) -> RepoResult<Comment> {
        let mut store = self.write();
        let comment = store.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.content = req.content.clone();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<()> {
        self.write()
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn get_topics(&self) -> RepoResult<Vec<Topic>> {
        Ok(self.read().topics.values().cloned().collect())
    }

    async fn get_topic(&self, id: i64) -> RepoResult<Topic> {
        self.read().topics.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn get_topic_by_name(&self, name: &str) -> RepoResult<Option<Topic>> {
        if self.names_stale() {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Ok(None);
        }
        Ok(self
            .read()
            .topics
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn get_topics_by_post(&self, post_id: i64) -> RepoResult<Vec<Topic>> {
        let store = self.read();
        let mut topics: Vec<Topic> = store
            .post_topics
            .iter()
            .filter(|pt| pt.post_id == post_id)
            .filter_map(|pt| store.topics.get(&pt.topic_id).cloned())
            .collect();
        topics.sort_by_key(|t| t.id);
        Ok(topics)
    }

    async fn create_topic(&self, req: &CreateTopicRequest) -> RepoResult<Topic> {
        let mut store = self.write();
        if store.topics.values().any(|t| t.name == req.name) {
            return Err(RepoError::UniqueViolation("topics_name_key".to_string()));
        }
        let id = store.next_id();
        let topic = Topic {
            id,
            name: req.name.clone(),
        };
        store.topics.insert(id, topic.clone());
        Ok(topic)
    }

    async fn update_topic(&self, id: i64, name: &str) -> RepoResult<Topic> {
        let mut store = self.write();
        if store.topics.values().any(|t| t.name == name && t.id != id) {
            return Err(RepoError::UniqueViolation("topics_name_key".to_string()));
        }
        let topic = store.topics.get_mut(&id).ok_or(RepoError::NotFound)?;
        topic.name = name.to_string();
        Ok(topic.clone())
    }

    async fn delete_topic(&self, id: i64) -> RepoResult<()> {
        let mut store = self.write();
        store.topics.remove(&id).ok_or(RepoError::NotFound)?;
        store.post_topics.retain(|pt| pt.topic_id != id);
        Ok(())
    }
}

// --- Test Utilities ---

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

/// Builds an `AppState` over `repo` with the test secret.
pub fn create_test_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState::new(repo, &test_config())
}

pub fn identity(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        username: user.username.clone(),
    }
}
