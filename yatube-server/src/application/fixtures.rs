use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::application::authoring_service::AuthoringService;
use crate::application::comment_service::CommentService;
use crate::application::listing_service::ListingService;
use crate::application::request_context::{Identity, RequestContext};
use crate::data::group_repository::GroupRepository;
use crate::data::memory::InMemoryStore;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::group::Group;
use crate::domain::post::Post;
use crate::domain::user::User;

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }

    pub fn listing(&self) -> ListingService {
        ListingService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
        )
    }

    pub fn authoring(&self) -> AuthoringService {
        AuthoringService::new(self.store.clone(), self.store.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.store.clone(), self.store.clone())
    }

    pub async fn user(&self, username: &str) -> User {
        let user = User::new(
            username.to_owned(),
            format!("{username}@example.com"),
            "not-a-hash".to_owned(),
        );
        UserRepository::create(self.store.as_ref(), user)
            .await
            .unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        let group = Group::new(
            format!("Group {slug}"),
            "Описание".to_owned(),
            slug.to_owned(),
        );
        GroupRepository::create(self.store.as_ref(), group)
            .await
            .unwrap()
    }

    /// Seeds `amount` posts one minute apart, returned oldest first.
    pub async fn seed_posts(&self, author: &User, group: Option<&Group>, amount: usize) -> Vec<Post> {
        let mut seeded = Vec::with_capacity(amount);
        for i in 0..amount {
            let mut post = Post::new(
                author.id,
                format!("Тестовый текст {i}"),
                group.map(|g| g.id),
                None,
            );
            post.pub_date = Utc::now() - Duration::minutes((amount - i) as i64);
            seeded.push(
                PostRepository::create(self.store.as_ref(), post)
                    .await
                    .unwrap(),
            );
        }
        seeded
    }

    pub async fn stored_post(&self, post: &Post) -> Post {
        PostRepository::find_by_id(self.store.as_ref(), post.id)
            .await
            .unwrap()
            .unwrap()
    }

    pub fn ctx(user: &User) -> RequestContext {
        RequestContext::authenticated(Identity {
            id: user.id,
            username: user.username.clone(),
        })
    }
}
