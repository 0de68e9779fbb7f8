//! Authentication endpoints: registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::common::SuccessResponse;
use crate::api::middleware::AppState;
use crate::error::PlatformError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.chars().count() < 3 || self.name.chars().count() > 100 {
            errors.push("name must be between 3 and 100 characters".to_string());
        }
        if !self.email.contains('@') || self.email.len() < 3 {
            errors.push("email must be a valid address".to_string());
        }
        if self.password.chars().count() < 6 {
            errors.push("password must be at least 6 characters".to_string());
        }
        errors
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = SuccessResponse),
        (status = 400, description = "Validation failed", body = crate::api::common::ApiError),
        (status = 409, description = "Email already in use", body = crate::api::common::ApiError),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, PlatformError> {
    let errors = req.validate();
    if !errors.is_empty() {
        return Err(PlatformError::validation(errors.join("; ")));
    }

    state.auth.register(&req.name, &req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_message("user registered")),
    ))
}

/// Authenticate and receive a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::common::ApiError),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, PlatformError> {
    let token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}
