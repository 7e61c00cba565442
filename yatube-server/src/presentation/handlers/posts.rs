use crate::application::authoring_service::{AuthoringOutcome, AuthoringService};
use crate::application::comment_service::{CommentOutcome, CommentService};
use crate::application::listing_service::ListingService;
use crate::application::request_context::RequestContext;
use crate::domain::error::DomainError;
use crate::domain::form::{CommentForm, PostForm};
use crate::presentation::context::{
    CREATE_POST_TEMPLATE, GROUP_LIST_TEMPLATE, GroupListContext, INDEX_TEMPLATE, IndexContext,
    POST_DETAIL_TEMPLATE, PROFILE_TEMPLATE, PostDetailContext, PostFormContext, ProfileContext,
    render,
};
use crate::presentation::dto::PageQuery;
use crate::presentation::utils::{
    post_detail_url, profile_url, redirect, redirect_to_login, request_id,
};
use actix_web::{Either, HttpRequest, HttpResponse, get, post, web};
use tracing::{info, warn};
use uuid::Uuid;

type Submitted<T> = Either<web::Json<T>, web::Form<T>>;

#[get("/")]
pub async fn index(
    listing: web::Data<ListingService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page_obj = listing.list_all(query.page.as_deref()).await?;
    Ok(render(INDEX_TEMPLATE, IndexContext { page_obj }))
}

#[get("/group/{slug}/")]
pub async fn group_posts(
    listing: web::Data<ListingService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let listing = listing
        .list_by_group(&path.into_inner(), query.page.as_deref())
        .await?;
    Ok(render(GROUP_LIST_TEMPLATE, GroupListContext::from(listing)))
}

#[get("/profile/{username}/")]
pub async fn profile(
    listing: web::Data<ListingService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let listing = listing
        .list_by_author(&path.into_inner(), query.page.as_deref())
        .await?;
    Ok(render(PROFILE_TEMPLATE, ProfileContext::from(listing)))
}

#[get("/posts/{id}/")]
pub async fn post_detail(
    listing: web::Data<ListingService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let detail = listing.get_detail(path.into_inner()).await?;
    Ok(render(POST_DETAIL_TEMPLATE, PostDetailContext::from(detail)))
}

#[get("/create/")]
pub async fn post_create_form(
    req: HttpRequest,
    ctx: RequestContext,
    authoring: web::Data<AuthoringService>,
) -> HttpResponse {
    respond(&req, &ctx, authoring.create_form(&ctx), false)
}

#[post("/create/")]
pub async fn post_create(
    req: HttpRequest,
    ctx: RequestContext,
    authoring: web::Data<AuthoringService>,
    payload: Submitted<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let outcome = authoring.create_post(&ctx, payload.into_inner()).await?;
    Ok(respond(&req, &ctx, outcome, false))
}

#[get("/posts/{id}/edit/")]
pub async fn post_edit_form(
    req: HttpRequest,
    ctx: RequestContext,
    authoring: web::Data<AuthoringService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let outcome = authoring.prepare_edit(&ctx, path.into_inner()).await?;
    Ok(respond(&req, &ctx, outcome, true))
}

#[post("/posts/{id}/edit/")]
pub async fn post_edit(
    req: HttpRequest,
    ctx: RequestContext,
    authoring: web::Data<AuthoringService>,
    path: web::Path<Uuid>,
    payload: Submitted<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let outcome = authoring
        .edit_post(&ctx, path.into_inner(), payload.into_inner())
        .await?;
    Ok(respond(&req, &ctx, outcome, true))
}

#[post("/posts/{id}/comment/")]
pub async fn add_comment(
    req: HttpRequest,
    ctx: RequestContext,
    comments: web::Data<CommentService>,
    path: web::Path<Uuid>,
    payload: Submitted<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    match comments
        .add_comment(&ctx, post_id, payload.into_inner())
        .await?
    {
        CommentOutcome::LoginRequired => Ok(redirect_to_login(&req)),
        CommentOutcome::Saved(_) => Ok(redirect(post_detail_url(post_id))),
        CommentOutcome::Rejected(errors) => {
            warn!(request_id = %request_id(&req), post_id = %post_id, ?errors, "comment rejected");
            Ok(redirect(post_detail_url(post_id)))
        }
    }
}

/// Create redirects to the author's profile, edit back to the post.
fn respond(
    req: &HttpRequest,
    ctx: &RequestContext,
    outcome: AuthoringOutcome,
    is_edit: bool,
) -> HttpResponse {
    match outcome {
        AuthoringOutcome::LoginRequired => redirect_to_login(req),
        AuthoringOutcome::NotAuthor(post_id) => redirect(post_detail_url(post_id)),
        AuthoringOutcome::Form(form) if is_edit => {
            render(CREATE_POST_TEMPLATE, PostFormContext::edit(form))
        }
        AuthoringOutcome::Form(form) => render(CREATE_POST_TEMPLATE, PostFormContext::create(form)),
        AuthoringOutcome::Saved(post) => {
            info!(request_id = %request_id(req), post_id = %post.id, "post saved");
            match (is_edit, ctx.identity()) {
                (false, Some(identity)) => redirect(profile_url(&identity.username)),
                _ => redirect(post_detail_url(post.id)),
            }
        }
    }
}
