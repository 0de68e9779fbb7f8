//! Repository interfaces and their Postgres implementations.

pub mod product;
pub mod user;

pub use product::PgProductRepository;
pub use user::PgUserRepository;

use async_trait::async_trait;

use crate::domain::{NewUser, Product, User};
use crate::error::Result;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product; duplicate SKUs surface as `PlatformError::Duplicate`.
    async fn insert(&self, product: &Product) -> Result<()>;
    async fn fetch_all(&self) -> Result<Vec<Product>>;
    async fn fetch_by_sku(&self, sku: i64) -> Result<Option<Product>>;
    async fn update(&self, product: &Product) -> Result<()>;
    /// Returns whether a row was actually deleted.
    async fn delete(&self, sku: i64) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; duplicate emails surface as `PlatformError::Duplicate`.
    async fn insert(&self, user: &NewUser) -> Result<User>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}
