//! Product CRUD endpoints.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::{AppState, CurrentUser};
use crate::domain::Product;
use crate::error::PlatformError;
use crate::service::Claims;

/// Incoming product data; timestamps and attribution are filled in here.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductPayload {
    pub sku: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    pub availability: String,
}

impl ProductPayload {
    fn into_product(self, actor: &Claims) -> Product {
        let now = Utc::now();
        Product {
            sku: self.sku,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            link: self.link,
            image_link: self.image_link,
            availability: self.availability,
            created_by: actor.name.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a bulk operation, keyed by SKU for the items that failed.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkResponse {
    pub succeeded: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub failures: HashMap<i64, String>,
}

impl BulkResponse {
    fn new(total: usize, failures: HashMap<i64, String>) -> Self {
        Self {
            succeeded: total.saturating_sub(failures.len()),
            failed: failures.len(),
            failures,
        }
    }
}

/// Accept either a single product object or an array of them.
fn parse_payloads(body: serde_json::Value) -> Result<Vec<ProductPayload>, PlatformError> {
    if body.is_array() {
        Ok(serde_json::from_value(body)?)
    } else {
        Ok(vec![serde_json::from_value(body)?])
    }
}

/// Create one or more products.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = Vec<ProductPayload>,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkResponse),
        (status = 401, description = "Not authenticated", body = crate::api::common::ApiError),
    ),
    tag = "products"
)]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BulkResponse>, PlatformError> {
    let payloads = parse_payloads(body)?;
    let total = payloads.len();
    let products = payloads
        .into_iter()
        .map(|payload| payload.into_product(&claims))
        .collect();

    let failures = state.products.create(products, &claims.email).await;
    Ok(Json(BulkResponse::new(total, failures)))
}

/// List all products.
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 401, description = "Not authenticated", body = crate::api::common::ApiError),
    ),
    tag = "products"
)]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_claims): CurrentUser,
) -> Result<Json<Vec<Product>>, PlatformError> {
    Ok(Json(state.products.get_all().await?))
}

/// Fetch one product by SKU.
#[utoipa::path(
    get,
    path = "/api/products/{sku}",
    params(("sku" = i64, Path, description = "Product SKU")),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 404, description = "No such product", body = crate::api::common::ApiError),
    ),
    tag = "products"
)]
pub async fn get_by_sku(
    State(state): State<AppState>,
    CurrentUser(_claims): CurrentUser,
    Path(sku): Path<i64>,
) -> Result<Json<Product>, PlatformError> {
    Ok(Json(state.products.get_by_sku(sku).await?))
}

/// Update one or more existing products.
#[utoipa::path(
    put,
    path = "/api/products",
    request_body = Vec<ProductPayload>,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkResponse),
        (status = 401, description = "Not authenticated", body = crate::api::common::ApiError),
    ),
    tag = "products"
)]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BulkResponse>, PlatformError> {
    let payloads = parse_payloads(body)?;
    let total = payloads.len();
    let products = payloads
        .into_iter()
        .map(|payload| payload.into_product(&claims))
        .collect();

    let failures = state.products.update(products, &claims.email).await;
    Ok(Json(BulkResponse::new(total, failures)))
}

/// Delete products by SKU.
#[utoipa::path(
    delete,
    path = "/api/products",
    request_body = Vec<i64>,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkResponse),
        (status = 401, description = "Not authenticated", body = crate::api::common::ApiError),
    ),
    tag = "products"
)]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(skus): Json<Vec<i64>>,
) -> Result<Json<BulkResponse>, PlatformError> {
    let total = skus.len();
    let failures = state.products.delete(skus, &claims.email).await;
    Ok(Json(BulkResponse::new(total, failures)))
}
