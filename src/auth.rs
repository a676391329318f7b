use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    db::DbPool,
    entities::admin_user::{self, Entity as AdminUserEntity},
    errors::ServiceError,
};

/// Name of the http-only cookie carrying the admin session token
pub const ADMIN_COOKIE: &str = "aromashop_admin";

/// JWT claims for an authenticated back-office admin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin user id
    pub sub: i32,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies admin session tokens and checks credentials.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DbPool>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_secs: u64,
}

impl AuthService {
    pub fn new(db: Arc<DbPool>, jwt_secret: &str, expiry_secs: u64) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            expiry_secs,
        }
    }

    /// Verifies admin credentials and returns a signed session token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ServiceError> {
        let admin = AdminUserEntity::find()
            .filter(admin_user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                warn!("Login attempt for unknown admin");
                ServiceError::AuthError("Invalid email or password".to_string())
            })?;

        if !verify_password(password, &admin.password_hash) {
            warn!(admin_id = admin.id, "Login attempt with wrong password");
            return Err(ServiceError::AuthError(
                "Invalid email or password".to_string(),
            ));
        }

        info!(admin_id = admin.id, "Admin logged in");
        self.sign_token(admin.id, &admin.email)
    }

    pub fn sign_token(&self, admin_id: i32, email: &str) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = AdminClaims {
            sub: admin_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.expiry_secs as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<AdminClaims, ServiceError> {
        decode::<AdminClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Unauthorized("Invalid or expired session".to_string()))
    }
}

/// Hashes a password with argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Failed to hash password: {}", e)))
}

/// Constant-time verification against a stored argon2 hash. A malformed
/// stored hash verifies as false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Extractor for admin-only routes. Reads the session cookie and verifies
/// it against the `AuthService` injected into request extensions.
pub struct AdminSession(pub AdminClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("Auth service not configured".to_string())
            })?;

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ADMIN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ServiceError::Unauthorized("Admin session required".to_string()))?;

        let claims = auth.verify_token(&token)?;
        Ok(AdminSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(DatabaseConnection::Disconnected),
            "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
            3600,
        )
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong-pass", &hash));
    }

    #[test]
    fn malformed_stored_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let svc = service();
        let token = svc.sign_token(42, "admin@example.com").unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "admin@example.com");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = service();
        let mut token = svc.sign_token(42, "admin@example.com").unwrap();
        token.push('x');
        assert!(svc.verify_token(&token).is_err());
    }
}
