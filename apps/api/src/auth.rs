//! JWT authentication module.
//!
//! Handles password hashing, token generation and validation, and the
//! middleware that guards every route except register, login, events and
//! health.
//!
//! ## Request Flow
//! ```text
//! POST /api/login {username, password}
//!      │  argon2 verify against users.password_hash
//!      ▼
//! { token: <HS256 JWT>, userName }
//!
//! GET /api/items   Authorization: Bearer <token>
//!      │  require_auth: decode + check exp
//!      ▼
//! Claims inserted into request extensions ──► handler
//! ```

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::SharedState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Username at the time of login
    pub username: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    /// The numeric user id carried in `sub`.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generate a token for a logged-in user.
    pub fn generate_token(&self, user_id: i64, username: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthorized("Invalid or expired token").with_details(e.to_string()))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool, off the async workers.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("Password check task failed: {e}")))
}

// =============================================================================
// Middleware
// =============================================================================

/// Rejects requests without a valid bearer token with 401; otherwise makes
/// the [`Claims`] available to handlers as `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

    let claims = state.jwt.validate_token(token)?;
    debug!(user = %claims.username, path = %request.uri().path(), "Authenticated request");

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_token(7, "asha").unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.username, "asha");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let a = manager.validate_token(&manager.generate_token(1, "a").unwrap()).unwrap();
        let b = manager.validate_token(&manager.generate_token(1, "a").unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-one".to_string(), 3600);
        let verifier = JwtManager::new("secret-two".to_string(), 3600);

        let token = issuer.generate_token(1, "asha").unwrap();
        let err = verifier.validate_token(&token).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Default validation allows 60s of leeway
        let manager = JwtManager::new("test-secret".to_string(), -120);

        let token = manager.generate_token(1, "asha").unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("hunter22").unwrap();

        assert_ne!(hash, "hunter22");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_password_hashing_on_blocking_pool() {
        let hash = hash_password_blocking("hunter22".to_string()).await.unwrap();

        assert!(verify_password_blocking("hunter22".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("hunter23".to_string(), hash)
            .await
            .unwrap());
    }
}
