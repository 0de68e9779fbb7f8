//! API Middleware
//!
//! JWT authentication for Axum handlers.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::error::PlatformError;
use crate::service::{AuthService, Claims, ProductService};

/// Application state containing shared services.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub auth: Arc<AuthService>,
}

/// Extractor for authenticated requests: validates the Bearer token and
/// exposes its claims to the handler.
pub struct CurrentUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                PlatformError::unauthorized("missing Authorization header").into_response()
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            PlatformError::unauthorized("invalid Authorization header format").into_response()
        })?;

        let claims = state
            .auth
            .validate_token(token)
            .map_err(|err| err.into_response())?;

        Ok(CurrentUser(claims))
    }
}
