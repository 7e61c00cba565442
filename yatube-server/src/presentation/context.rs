//! Page contexts: the named fields each template consumes.

use actix_web::HttpResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::authoring_service::FormState;
use crate::application::listing_service::{AuthorListing, GroupListing, PostDetail};
use crate::domain::comment::Comment;
use crate::domain::group::Group;
use crate::domain::pagination::Page;
use crate::domain::post::Post;
use crate::domain::user::User;

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_LIST_TEMPLATE: &str = "posts/group_list.html";
pub const PROFILE_TEMPLATE: &str = "posts/profile.html";
pub const POST_DETAIL_TEMPLATE: &str = "posts/post_detail.html";
pub const CREATE_POST_TEMPLATE: &str = "posts/create_post.html";

#[derive(Debug, Serialize)]
pub struct Rendered<C> {
    pub template: &'static str,
    pub context: C,
}

pub fn render<C: Serialize>(template: &'static str, context: C) -> HttpResponse {
    HttpResponse::Ok().json(Rendered { template, context })
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct GroupListContext {
    pub group: Group,
    pub page_obj: Page<Post>,
}

impl From<GroupListing> for GroupListContext {
    fn from(listing: GroupListing) -> Self {
        Self {
            group: listing.group,
            page_obj: listing.page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub page_obj: Page<Post>,
    pub author: User,
    pub posts_amount: u64,
}

impl From<AuthorListing> for ProfileContext {
    fn from(listing: AuthorListing) -> Self {
        Self {
            page_obj: listing.page,
            author: listing.author,
            posts_amount: listing.posts_amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: Post,
    pub post_title: String,
    pub pub_date: DateTime<Utc>,
    pub author: User,
    pub author_posts_amount: u64,
    pub group: Option<Group>,
    pub comments: Vec<Comment>,
}

impl From<PostDetail> for PostDetailContext {
    fn from(detail: PostDetail) -> Self {
        Self {
            pub_date: detail.post.pub_date,
            post: detail.post,
            post_title: detail.title,
            author: detail.author,
            author_posts_amount: detail.author_posts_amount,
            group: detail.group,
            comments: detail.comments,
        }
    }
}

/// Shared by create and edit; `is_edit` only appears on the edit page.
#[derive(Debug, Serialize)]
pub struct PostFormContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_edit: Option<bool>,
    pub form: FormState,
}

impl PostFormContext {
    pub fn create(form: FormState) -> Self {
        Self {
            is_edit: None,
            form,
        }
    }

    pub fn edit(form: FormState) -> Self {
        Self {
            is_edit: Some(true),
            form,
        }
    }
}
