use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ValidJson};
use crate::domain::{is_valid_email, DomainError, FieldError, NewUser};
use crate::infrastructure::auth::{create_jwt, hash_password, verify_password};
use crate::infrastructure::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    username: String,
    email: String,
    password: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "must not be empty"));
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    access_token: String,
    token_type: String,
}

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = crate::domain::User),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Malformed body")
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let password_hash = hash_password(&payload.password).map_err(DomainError::Internal)?;
    let user = state
        .user_repo
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    tracing::info!("Login attempt for: {}", payload.email);

    let invalid = || DomainError::Unauthorized("Invalid credentials".to_string());

    let (user, password_hash) = match state.user_repo.find_credentials(&payload.email).await? {
        Some(found) => found,
        None => {
            tracing::warn!("User not found: {}", payload.email);
            return Err(invalid().into());
        }
    };

    match verify_password(&payload.password, &password_hash) {
        Ok(true) => {
            tracing::info!("Password verified successfully for user: {}", user.id);
            let token = create_jwt(
                &state.config.jwt_secret,
                &user,
                state.config.jwt_expiry_hours,
            )
            .map_err(DomainError::Internal)?;
            Ok(Json(TokenResponse {
                access_token: token,
                token_type: "bearer".to_string(),
            }))
        }
        _ => {
            tracing::warn!("Password verification failed for user: {}", user.id);
            Err(invalid().into())
        }
    }
}
