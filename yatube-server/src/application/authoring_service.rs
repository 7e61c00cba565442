use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::request_context::{Identity, RequestContext};
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::form::{FieldError, INVALID_CHOICE, PostForm};
use crate::domain::group::Group;
use crate::domain::post::Post;

/// The form as it should be redisplayed, with any field errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormState {
    pub data: PostForm,
    pub errors: Vec<FieldError>,
}

impl FormState {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn rejected(data: PostForm, errors: Vec<FieldError>) -> Self {
        Self { data, errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub enum AuthoringOutcome {
    Saved(Post),
    /// Show the form: initial display, or redisplay after validation failed.
    Form(FormState),
    LoginRequired,
    /// Caller is not the post's author. Nothing was written.
    NotAuthor(Uuid),
}

/// Write side for posts. The only writer of `Post` rows.
#[derive(Clone)]
pub struct AuthoringService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl AuthoringService {
    pub fn new(posts: Arc<dyn PostRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self { posts, groups }
    }

    pub fn create_form(&self, ctx: &RequestContext) -> AuthoringOutcome {
        match ctx.identity() {
            Some(_) => AuthoringOutcome::Form(FormState::blank()),
            None => AuthoringOutcome::LoginRequired,
        }
    }

    #[instrument(skip(self, ctx, form), fields(text_len = form.text.len()))]
    pub async fn create_post(
        &self,
        ctx: &RequestContext,
        form: PostForm,
    ) -> Result<AuthoringOutcome, DomainError> {
        let Some(identity) = ctx.identity() else {
            return Ok(AuthoringOutcome::LoginRequired);
        };

        let (text, group, image) = match self.clean(&form).await? {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(AuthoringOutcome::Form(FormState::rejected(form, errors))),
        };

        let post = Post::new(identity.id, text, group.map(|g| g.id), image);
        let post = self.posts.create(post).await?;
        info!(post_id = %post.id, author = %identity.username, "post published");
        Ok(AuthoringOutcome::Saved(post))
    }

    pub async fn prepare_edit(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
    ) -> Result<AuthoringOutcome, DomainError> {
        let Some(identity) = ctx.identity() else {
            return Ok(AuthoringOutcome::LoginRequired);
        };
        let post = self.load_post(post_id).await?;
        if !post.is_authored_by(identity.id) {
            return Ok(AuthoringOutcome::NotAuthor(post.id));
        }

        let group = match post.group_id {
            Some(group_id) => self.groups.find_by_id(group_id).await?,
            None => None,
        };
        Ok(AuthoringOutcome::Form(FormState {
            data: PostForm {
                text: post.text,
                group: group.map(|g| g.slug),
                image: post.image,
            },
            errors: Vec::new(),
        }))
    }

    #[instrument(skip(self, ctx, form), fields(post_id = %post_id))]
    pub async fn edit_post(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
        form: PostForm,
    ) -> Result<AuthoringOutcome, DomainError> {
        let Some(identity) = ctx.identity() else {
            return Ok(AuthoringOutcome::LoginRequired);
        };
        let mut post = self.load_post(post_id).await?;
        if !post.is_authored_by(identity.id) {
            refuse(identity, &post);
            return Ok(AuthoringOutcome::NotAuthor(post.id));
        }

        let (text, group, image) = match self.clean(&form).await? {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(AuthoringOutcome::Form(FormState::rejected(form, errors))),
        };

        post.apply_edit(text, group.map(|g| g.id), image);
        let post = self
            .posts
            .update(post)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        info!(post_id = %post.id, author = %identity.username, "post edited");
        Ok(AuthoringOutcome::Saved(post))
    }

    async fn load_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    /// Field validation plus the group lookup. The outer `Result` carries storage errors.
    async fn clean(
        &self,
        form: &PostForm,
    ) -> Result<Result<(String, Option<Group>, Option<String>), Vec<FieldError>>, DomainError> {
        let valid = match form.validate() {
            Ok(valid) => valid,
            Err(errors) => return Ok(Err(errors)),
        };

        let group = match valid.group.as_deref() {
            Some(slug) => match self.groups.find_by_slug(slug).await? {
                Some(group) => Some(group),
                None => return Ok(Err(vec![FieldError::new("group", INVALID_CHOICE)])),
            },
            None => None,
        };

        Ok(Ok((valid.text, group, valid.image)))
    }
}

fn refuse(identity: &Identity, post: &Post) {
    warn!(
        post_id = %post.id,
        author_id = %post.author_id,
        requested_by = %identity.id,
        "edit refused: caller is not the author"
    );
}
