use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{PostFilter, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::pagination::{POSTS_PER_PAGE, Page, Paginator};
use crate::domain::post::Post;
use crate::domain::user::User;

#[derive(Debug, Serialize)]
pub struct GroupListing {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct AuthorListing {
    pub author: User,
    pub posts_amount: u64,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub title: String,
    pub author: User,
    pub author_posts_amount: u64,
    pub group: Option<Group>,
    pub comments: Vec<Comment>,
}

/// Read side: ordered, filtered and paginated post listings.
#[derive(Clone)]
pub struct ListingService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl ListingService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            comments,
        }
    }

    pub async fn list_all(&self, page: Option<&str>) -> Result<Page<Post>, DomainError> {
        self.paginate(PostFilter::All, page).await
    }

    pub async fn list_by_group(
        &self,
        slug: &str,
        page: Option<&str>,
    ) -> Result<GroupListing, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_owned()))?;
        let page = self.paginate(PostFilter::Group(group.id), page).await?;
        Ok(GroupListing { group, page })
    }

    pub async fn list_by_author(
        &self,
        username: &str,
        page: Option<&str>,
    ) -> Result<AuthorListing, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_owned()))?;
        let page = self.paginate(PostFilter::Author(author.id), page).await?;
        Ok(AuthorListing {
            author,
            posts_amount: page.count,
            page,
        })
    }

    pub async fn get_detail(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        // a post without a stored author breaks the cascade invariant
        let author = self.users.find_by_id(post.author_id).await?.ok_or_else(|| {
            DomainError::Internal(format!("post {} references missing author", post.id))
        })?;
        let author_posts_amount = self.posts.count(PostFilter::Author(author.id)).await?;
        let group = match post.group_id {
            Some(group_id) => self.groups.find_by_id(group_id).await?,
            None => None,
        };
        let comments = self.comments.list_for_post(post.id).await?;

        Ok(PostDetail {
            title: post.title(),
            post,
            author,
            author_posts_amount,
            group,
            comments,
        })
    }

    async fn paginate(
        &self,
        filter: PostFilter,
        page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        let count = self.posts.count(filter).await?;
        let paginator = Paginator::new(count, POSTS_PER_PAGE);
        let number = paginator.resolve(page);
        let posts = self
            .posts
            .list(filter, paginator.limit(), paginator.offset(number))
            .await?;
        debug!(?filter, count, page = number, "posts paginated");
        Ok(paginator.page(posts, number))
    }
}
