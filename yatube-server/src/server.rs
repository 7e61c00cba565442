use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::authoring_service::AuthoringService;
use crate::application::comment_service::CommentService;
use crate::application::listing_service::ListingService;
use crate::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use crate::data::group_repository::{GroupRepository, PostgresGroupRepository};
use crate::data::memory::InMemoryStore;
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database::{create_pool, run_migrations};
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{IdentityMiddleware, RequestTracingMiddleware};
use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// The repositories every service is built from.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub users: Arc<dyn UserRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            posts: store.clone(),
            groups: store.clone(),
            users: store.clone(),
            comments: store,
        }
    }

    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let Some(database_url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set, using in-memory store");
            return Ok(Self::in_memory(Arc::new(InMemoryStore::new())));
        };

        let pool = create_pool(database_url)
            .await
            .context("failed to connect to database")?;
        run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        Ok(Self {
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            groups: Arc::new(PostgresGroupRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool)),
        })
    }
}

#[derive(Clone)]
pub struct Services {
    pub listing: ListingService,
    pub authoring: AuthoringService,
    pub comments: CommentService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(repos: Repositories, keys: JwtKeys) -> Self {
        Self {
            listing: ListingService::new(
                repos.posts.clone(),
                repos.groups.clone(),
                repos.users.clone(),
                repos.comments.clone(),
            ),
            authoring: AuthoringService::new(repos.posts.clone(), repos.groups),
            comments: CommentService::new(repos.posts, repos.comments),
            auth: AuthService::new(repos.users, keys),
        }
    }

    /// Registers service data and every route. Mount [`IdentityMiddleware`]
    /// around it to resolve callers.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.listing.clone()))
            .app_data(web::Data::new(self.authoring.clone()))
            .app_data(web::Data::new(self.comments.clone()))
            .app_data(web::Data::new(self.auth.clone()))
            .route("/health", web::get().to(health));
        handlers::routes(cfg);
    }
}

pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let repos = Repositories::connect(&config).await?;
    let services = Services::new(repos, JwtKeys::new(config.jwt_secret.clone()));
    let bind_address = (config.host.clone(), config.port);

    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        let cors = build_cors(&config);
        let services = services.clone();

        App::new()
            .wrap(IdentityMiddleware::new(services.auth.clone()))
            .wrap(Logger::default())
            .wrap(RequestTracingMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .configure(|cfg| services.configure(cfg))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
