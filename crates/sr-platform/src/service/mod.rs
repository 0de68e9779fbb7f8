//! Business services: validate, persist, publish.

pub mod auth;
pub mod products;

pub use auth::{AuthConfig, AuthService, Claims};
pub use products::ProductService;
