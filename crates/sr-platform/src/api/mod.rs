//! REST API: routing and OpenAPI documentation.

pub mod auth;
pub mod common;
pub mod middleware;
pub mod products;

pub use middleware::{AppState, CurrentUser};

use axum::routing::{get, post};
use axum::{Json, Router};
use utoipa::OpenApi;

/// Build the application router. `/api/register` and `/api/login` are
/// public; everything under `/api/products` requires a bearer token.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route(
            "/api/products",
            post(products::create)
                .get(products::list)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/api/products/:sku", get(products::get_by_sku))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        products::create,
        products::list,
        products::get_by_sku,
        products::update,
        products::remove,
    ),
    components(schemas(
        common::ApiError,
        common::SuccessResponse,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::TokenResponse,
        products::ProductPayload,
        products::BulkResponse,
        crate::domain::Product,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "products", description = "Product catalog CRUD"),
    )
)]
pub struct ApiDoc;
