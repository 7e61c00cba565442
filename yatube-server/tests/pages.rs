use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, LOCATION};
use actix_web::{App, test};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use yatube_server::data::group_repository::GroupRepository;
use yatube_server::data::memory::InMemoryStore;
use yatube_server::data::post_repository::{PostFilter, PostRepository};
use yatube_server::domain::group::Group;
use yatube_server::domain::post::Post;
use yatube_server::domain::user::User;
use yatube_server::infrastructure::security::JwtKeys;
use yatube_server::presentation::middleware::{IdentityMiddleware, RequestTracingMiddleware};
use yatube_server::server::{Repositories, Services};

struct Site {
    store: Arc<InMemoryStore>,
    services: Services,
}

impl Site {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let services = Services::new(
            Repositories::in_memory(store.clone()),
            JwtKeys::new("test-secret".into()),
        );
        Self { store, services }
    }

    async fn user(&self, username: &str) -> (User, String) {
        let user = self
            .services
            .auth
            .register(
                username.into(),
                format!("{username}@example.com"),
                "password1".into(),
            )
            .await
            .unwrap();
        let token = self.services.auth.issue_token(&user).unwrap();
        (user, format!("Bearer {token}"))
    }

    async fn group(&self, slug: &str) -> Group {
        let group = Group::new("Имя".into(), "Описание".into(), slug.into());
        GroupRepository::create(self.store.as_ref(), group)
            .await
            .unwrap()
    }

    async fn posts(&self, author: &User, group: Option<&Group>, amount: usize) -> Vec<Post> {
        let mut created = Vec::new();
        for i in 0..amount {
            let mut post = Post::new(
                author.id,
                format!("Тестовый текст {i}"),
                group.map(|g| g.id),
                None,
            );
            post.pub_date = Utc::now() - Duration::minutes((amount - i) as i64);
            created.push(
                PostRepository::create(self.store.as_ref(), post)
                    .await
                    .unwrap(),
            );
        }
        created
    }

    async fn stored(&self, id: Uuid) -> Post {
        PostRepository::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
            .unwrap()
    }

    async fn total(&self) -> u64 {
        self.store.count(PostFilter::All).await.unwrap()
    }
}

macro_rules! app {
    ($site:expr) => {{
        let services = $site.services.clone();
        test::init_service(
            App::new()
                .wrap(IdentityMiddleware::new(services.auth.clone()))
                .configure(|cfg| services.configure(cfg)),
        )
        .await
    }};
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> &str {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[actix_web::test]
async fn index_paginates_by_ten() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    site.posts(&author, None, 12).await;
    let app = app!(site);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(body["template"], "posts/index.html");
    assert_eq!(body["context"]["page_obj"]["object_list"].as_array().unwrap().len(), 10);
    assert_eq!(body["context"]["page_obj"]["has_next"], true);
    assert_eq!(body["context"]["page_obj"]["num_pages"], 2);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/?page=2").to_request(),
    )
    .await;
    assert_eq!(body["context"]["page_obj"]["object_list"].as_array().unwrap().len(), 2);
    assert_eq!(body["context"]["page_obj"]["has_previous"], true);
}

#[actix_web::test]
async fn out_of_range_page_clamps_to_last() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    site.posts(&author, None, 10).await;
    let app = app!(site);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/?page=7").to_request(),
    )
    .await;
    assert_eq!(body["context"]["page_obj"]["number"], 1);
    assert_eq!(body["context"]["page_obj"]["object_list"].as_array().unwrap().len(), 10);
}

#[actix_web::test]
async fn group_page_lists_only_its_posts() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    let group = site.group("test-slug").await;
    let fake = site.group("test-fake-slug").await;
    site.posts(&author, Some(&group), 3).await;
    let foreign = site.posts(&author, Some(&fake), 1).await.remove(0);
    let app = app!(site);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/test-slug/").to_request(),
    )
    .await;
    assert_eq!(body["template"], "posts/group_list.html");
    assert_eq!(body["context"]["group"]["slug"], "test-slug");
    let listed = body["context"]["page_obj"]["object_list"].as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|p| p["id"] != json!(foreign.id)));
}

#[actix_web::test]
async fn unknown_group_and_profile_are_404() {
    let site = Site::new();
    let app = app!(site);

    for uri in ["/group/missing/", "/profile/ghost/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn profile_reports_posts_amount() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    site.posts(&author, None, 11).await;
    let app = app!(site);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/profile/hasNoName/").to_request(),
    )
    .await;
    assert_eq!(body["template"], "posts/profile.html");
    assert_eq!(body["context"]["posts_amount"], 11);
    assert_eq!(body["context"]["author"]["username"], "hasNoName");
    assert!(body["context"]["author"].get("password_hash").is_none());
    assert_eq!(body["context"]["page_obj"]["object_list"].as_array().unwrap().len(), 10);
}

#[actix_web::test]
async fn detail_page_context() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    let post = site.posts(&author, None, 2).await.remove(0);
    let app = app!(site);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    let ctx = &body["context"];
    assert_eq!(body["template"], "posts/post_detail.html");
    assert_eq!(ctx["post"]["id"], json!(post.id));
    assert_eq!(ctx["post_title"], post.title());
    assert_eq!(ctx["pub_date"], json!(post.pub_date));
    assert_eq!(ctx["author"]["username"], "hasNoName");
    assert_eq!(ctx["author_posts_amount"], 2);
}

#[actix_web::test]
async fn missing_post_is_404() {
    let site = Site::new();
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", Uuid::new_v4()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/posts/not-an-id/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_create_redirects_to_login() {
    let site = Site::new();
    let app = app!(site);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .set_json(json!({ "text": "hello" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(site.total().await, 0);
}

#[actix_web::test]
async fn create_form_is_blank() {
    let site = Site::new();
    let (_, token) = site.user("hasNoName").await;
    let app = app!(site);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .insert_header((AUTHORIZATION, token))
            .to_request(),
    )
    .await;
    assert_eq!(body["template"], "posts/create_post.html");
    assert_eq!(body["context"]["form"]["data"]["text"], "");
    assert!(body["context"].get("is_edit").is_none());
}

#[actix_web::test]
async fn create_redirects_to_profile() {
    let site = Site::new();
    let (author, token) = site.user("hasNoName").await;
    let group = site.group("test-slug").await;
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((AUTHORIZATION, token))
            .set_json(json!({ "text": "Я не люблю тестирование!", "group": "test-slug" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/hasNoName/");
    assert_eq!(site.total().await, 1);
    let listed = site.store.list(PostFilter::Group(group.id), 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].text, "Я не люблю тестирование!");
    assert_eq!(listed[0].author_id, author.id);
}

#[actix_web::test]
async fn create_accepts_urlencoded_form() {
    let site = Site::new();
    let (_, token) = site.user("hasNoName").await;
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((AUTHORIZATION, token))
            .set_form([("text", "from a form"), ("group", "")])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(site.total().await, 1);
}

#[actix_web::test]
async fn invalid_create_redisplays_form() {
    let site = Site::new();
    let (_, token) = site.user("hasNoName").await;
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((AUTHORIZATION, token))
            .set_json(json!({ "text": "", "group": "missing" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["context"]["form"]["errors"][0]["field"], "text");
    assert_eq!(body["context"]["form"]["data"]["group"], "missing");
    assert_eq!(site.total().await, 0);
}

#[actix_web::test]
async fn author_edits_post() {
    let site = Site::new();
    let (author, token) = site.user("hasNoName").await;
    let group = site.group("test-slug").await;
    let other = site.group("test-slug2").await;
    let post = site.posts(&author, Some(&group), 1).await.remove(0);
    let app = app!(site);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((AUTHORIZATION, token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(body["context"]["is_edit"], true);
    assert_eq!(body["context"]["form"]["data"]["text"], post.text);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((AUTHORIZATION, token))
            .set_json(json!({ "text": "Я терпеть не могу тестирование!", "group": "test-slug2" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    let stored = site.stored(post.id).await;
    assert_eq!(stored.text, "Я терпеть не могу тестирование!");
    assert_eq!(stored.group_id, Some(other.id));
    assert_eq!(stored.pub_date, post.pub_date);
    assert_eq!(site.total().await, 1);
}

#[actix_web::test]
async fn non_author_edit_redirects_without_change() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    let (_, intruder) = site.user("intruder").await;
    let post = site.posts(&author, None, 1).await.remove(0);
    let app = app!(site);

    for req in [
        test::TestRequest::get()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((AUTHORIZATION, intruder.clone()))
            .to_request(),
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((AUTHORIZATION, intruder.clone()))
            .set_json(json!({ "text": "hijacked" }))
            .to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    }
    assert_eq!(site.stored(post.id).await, post);
}

#[actix_web::test]
async fn comment_is_added_and_listed() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    let (_, reader) = site.user("reader").await;
    let post = site.posts(&author, None, 1).await.remove(0);
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", post.id))
            .insert_header((AUTHORIZATION, reader))
            .set_json(json!({ "text": "Отличный пост" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(body["context"]["comments"][0]["text"], "Отличный пост");
}

#[actix_web::test]
async fn invalid_token_is_rejected() {
    let site = Site::new();
    let app = app!(site);

    let result = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .insert_header((AUTHORIZATION, "Bearer forged"))
            .to_request(),
    )
    .await;
    let err = result.err().expect("forged token must fail");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn rejected_token_response_is_traced() {
    let site = Site::new();
    let services = site.services.clone();
    let app = test::init_service(
        App::new()
            .wrap(IdentityMiddleware::new(services.auth.clone()))
            .wrap(RequestTracingMiddleware)
            .configure(|cfg| services.configure(cfg)),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .insert_header((AUTHORIZATION, "Bearer forged"))
            .insert_header(("x-request-id", "req-42"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-42");
    assert!(resp.headers().contains_key("server-timing"));
}

#[actix_web::test]
async fn anonymous_edit_redirects_to_login() {
    let site = Site::new();
    let (author, _) = site.user("hasNoName").await;
    let post = site.posts(&author, None, 1).await.remove(0);
    let app = app!(site);

    for id in [post.id, Uuid::new_v4()] {
        let uri = format!("/posts/{id}/edit/");
        let expected = format!("/auth/login/?next={uri}");

        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), expected);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({ "text": "hijacked" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), expected);
    }
    assert_eq!(site.stored(post.id).await, post);
}

#[actix_web::test]
async fn signup_rejects_unroutable_usernames() {
    let site = Site::new();
    let app = app!(site);

    for (username, password) in [("a/b", "password1"), ("", "password1"), ("hasNoName", "")] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/auth/signup/")
                .set_json(json!({ "username": username, "email": "a@b.c", "password": password }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{username:?}");
    }
}

#[actix_web::test]
async fn create_redirect_reaches_profile() {
    let site = Site::new();
    let (_, token) = site.user("leo.tolstoy+blog").await;
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((AUTHORIZATION, token))
            .set_json(json!({ "text": "Война и мир" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let profile = location(&resp).to_owned();
    assert_eq!(profile, "/profile/leo.tolstoy+blog/");

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&profile).to_request())
            .await;
    assert_eq!(body["context"]["author"]["username"], "leo.tolstoy+blog");
    assert_eq!(body["context"]["posts_amount"], 1);
}

#[actix_web::test]
async fn signup_then_login() {
    let site = Site::new();
    let app = app!(site);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({ "username": "hasNoName", "email": "a@b.c", "password": "password1" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "hasNoName", "password": "password1" }))
            .to_request(),
    )
    .await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({ "username": "hasNoName", "email": "x@y.z", "password": "password1" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn health_is_ok() {
    let site = Site::new();
    let app = app!(site);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(body["status"], "ok");
}
