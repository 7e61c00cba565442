//! In-memory store - used when no `DATABASE_URL` is configured, and by tests.
//!
//! Data is lost on process restart. Unique constraints on group slug and
//! username are enforced the same way the Postgres schema enforces them.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{PostFilter, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::Post;
use crate::domain::user::User;

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    groups: RwLock<HashMap<Uuid, Group>>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered(&self, filter: PostFilter) -> Vec<Post> {
        let posts = self.posts.read().await;
        let mut matching: Vec<Post> = posts
            .iter()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        // same order as the SQL listing: pub_date, then id
        matching.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));
        matching
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let mut posts = self.posts.write().await;
        posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|post| post.id == id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(stored) = posts.iter_mut().find(|stored| stored.id == post.id) else {
            return Ok(None);
        };
        stored.text = post.text;
        stored.group_id = post.group_id;
        stored.image = post.image;
        Ok(Some(stored.clone()))
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, DomainError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().filter(|post| filter.matches(post)).count() as u64)
    }

    async fn list(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        Ok(self
            .filtered(filter)
            .await
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn create(&self, group: Group) -> Result<Group, DomainError> {
        let mut groups = self.groups.write().await;
        if groups.values().any(|existing| existing.slug == group.slug) {
            return Err(DomainError::Internal(format!(
                "duplicate group slug: {}",
                group.slug
            )));
        }
        groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let groups = self.groups.read().await;
        Ok(groups.values().find(|group| group.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, DomainError> {
        let groups = self.groups.read().await;
        Ok(groups.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        let mut comments = self.comments.write().await;
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        let comments = self.comments.read().await;
        let mut found: Vec<Comment> = comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(found)
    }
}
