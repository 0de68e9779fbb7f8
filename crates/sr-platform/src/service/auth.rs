//! Registration, login, and JWT issuance/validation.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{NewUser, User};
use crate::error::{PlatformError, Result};
use crate::repository::UserRepository;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 48,
        }
    }
}

/// JWT claims carried by every authenticated request. `email` doubles as the
/// notify address attached to published product events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub email: String,
    pub exp: i64,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;
        let user = self
            .users
            .insert(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;
        info!(email = %user.email, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue an HS256 token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(PlatformError::InvalidCredentials)?;

        if let Err(err) = verify_password(password, &user.password_hash) {
            warn!(email = %email, "login rejected");
            return Err(err);
        }

        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            exp: (Utc::now() + chrono::Duration::hours(self.config.token_ttl_hours)).timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        info!(email = %user.email, "user logged in");
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PlatformError::PasswordHash(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash).map_err(|err| PlatformError::PasswordHash(err.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PlatformError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemoryUsers {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn insert(&self, user: &NewUser) -> Result<User> {
            let mut users = self.users.lock();
            if users.iter().any(|u| u.email == user.email) {
                return Err(PlatformError::duplicate("user", &user.email));
            }
            let stored = User {
                id: users.len() as i64 + 1,
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                created_at: Utc::now(),
            };
            users.push(stored.clone());
            Ok(stored)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUsers::default()),
            AuthConfig::new("test-secret"),
        )
    }

    #[tokio::test]
    async fn register_login_and_validate_roundtrip() {
        let svc = service();
        svc.register("Amanda", "amanda@example.com", "hunter22")
            .await
            .unwrap();

        let token = svc.login("amanda@example.com", "hunter22").await.unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.email, "amanda@example.com");
        assert_eq!(claims.name, "Amanda");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let svc = service();
        svc.register("Amanda", "amanda@example.com", "hunter22")
            .await
            .unwrap();

        let err = svc.login("amanda@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_email_is_rejected_like_a_bad_password() {
        let svc = service();
        let err = svc.login("nobody@example.com", "whatever").await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_email_cannot_register_twice() {
        let svc = service();
        svc.register("Amanda", "amanda@example.com", "hunter22")
            .await
            .unwrap();
        let err = svc
            .register("Other", "amanda@example.com", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn tampered_token_fails_validation() {
        let svc = service();
        svc.register("Amanda", "amanda@example.com", "hunter22")
            .await
            .unwrap();
        let token = svc.login("amanda@example.com", "hunter22").await.unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(svc.validate_token(&tampered).is_err());
    }
}
