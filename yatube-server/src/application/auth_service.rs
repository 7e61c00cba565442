use std::sync::Arc;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::application::request_context::Identity;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{User, is_valid_username};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

/// Stands in for the external authentication provider: accounts, tokens, identity.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        if !is_valid_username(&username) {
            return Err(DomainError::Validation(
                "username may contain only letters, digits and @/./+/-/_".into(),
            ));
        }
        if password.is_empty() {
            return Err(DomainError::Validation("password is required".into()));
        }
        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email.to_lowercase(), hash);
        self.repo.create(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Resolves a bearer token to the identity it was issued for.
    pub async fn identify(&self, token: &str) -> Result<Identity, DomainError> {
        let claims = self.keys.verify_token(token).map_err(|err| {
            warn!("rejected token: {}", err);
            DomainError::Unauthorized
        })?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| DomainError::Unauthorized)?;
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        Ok(Identity {
            id: user.id,
            username: user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(InMemoryStore::new()), JwtKeys::new("test".into()))
    }

    #[tokio::test]
    async fn register_then_login_identifies_user() {
        let auth = service();
        let user = auth
            .register("hasNoName".into(), "Has@Example.com".into(), "password1".into())
            .await
            .unwrap();
        assert_eq!(user.email, "has@example.com");

        let token = auth.login("hasNoName", "password1").await.unwrap();
        let identity = auth.identify(&token).await.unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.username, "hasNoName");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.register("hasNoName".into(), "a@b.c".into(), "password1".into())
            .await
            .unwrap();

        let err = auth.login("hasNoName", "nope").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let err = service().identify("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn unroutable_username_is_rejected() {
        let auth = service();
        for username in ["", "a/b", "has no name"] {
            let err = auth
                .register(username.into(), "a@b.c".into(), "password1".into())
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{username:?}");
        }
        assert!(auth.login("a/b", "password1").await.is_err());
    }

    #[tokio::test]
    async fn empty_password_is_rejected() {
        let err = service()
            .register("hasNoName".into(), "a@b.c".into(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
