use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::infrastructure::security::TOKEN_TTL_HOURS;
use crate::presentation::dto::{AuthResponse, LoginRequest, SignupRequest};
use actix_web::{HttpResponse, Scope, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth").service(signup).service(login)
}

fn token_response(access_token: String) -> AuthResponse {
    AuthResponse {
        access_token,
        expires_in: TOKEN_TTL_HOURS * 3600,
        token_type: "Bearer".to_string(),
    }
}

#[post("/signup/")]
async fn signup(
    service: web::Data<AuthService>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, DomainError> {
    let SignupRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let user = service.register(username, email, password).await?;
    let jwt = service.issue_token(&user)?;

    info!(user_id = %user.id, username = %user.username, "user registered");

    Ok(HttpResponse::Created().json(token_response(jwt)))
}

#[post("/login/")]
async fn login(
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let jwt = service.login(&payload.username, &payload.password).await?;

    info!(username = %payload.username, "user logged in");

    Ok(HttpResponse::Ok().json(token_response(jwt)))
}
