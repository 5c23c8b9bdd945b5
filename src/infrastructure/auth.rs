use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::error::ApiError;
use crate::domain::{DomainError, User, UserRepository};
use crate::infrastructure::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_jwt(secret: &str, user: &User, expiry_hours: i64) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(expiry_hours))
        .ok_or_else(|| "token expiry out of range".to_string())?
        .timestamp();

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(secret: &str, token: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Resolve a bearer token to the account it was issued for.
pub async fn get_current_user(
    users: &dyn UserRepository,
    secret: &str,
    token: &str,
) -> Result<User, DomainError> {
    let claims = decode_jwt(secret, token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        DomainError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| DomainError::Unauthorized("Invalid token subject".to_string()))?;

    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| DomainError::Unauthorized("Unknown user".to_string()))
}

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                DomainError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            DomainError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let user = get_current_user(state.user_repo.as_ref(), &state.config.jwt_secret, token)
            .await
            .map_err(|e| {
                if let DomainError::Unauthorized(reason) = &e {
                    tracing::warn!("Authentication failed: {}", reason);
                }
                e
            })?;

        Ok(CurrentUser(user))
    }
}
