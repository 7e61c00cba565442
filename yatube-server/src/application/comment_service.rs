use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::request_context::RequestContext;
use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::form::{CommentForm, FieldError};

#[derive(Debug)]
pub enum CommentOutcome {
    Saved(Comment),
    Rejected(Vec<FieldError>),
    LoginRequired,
}

#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { posts, comments }
    }

    #[instrument(skip(self, ctx, form), fields(post_id = %post_id))]
    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
        form: CommentForm,
    ) -> Result<CommentOutcome, DomainError> {
        let Some(identity) = ctx.identity() else {
            return Ok(CommentOutcome::LoginRequired);
        };
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;

        let text = match form.validate() {
            Ok(text) => text,
            Err(errors) => return Ok(CommentOutcome::Rejected(errors)),
        };

        let comment = self
            .comments
            .create(Comment::new(post.id, identity.id, text))
            .await?;
        info!(comment_id = %comment.id, author = %identity.username, "comment added");
        Ok(CommentOutcome::Saved(comment))
    }
}
