//! Stockroom Platform
//!
//! The CRUD side of the system: product and user domain types, Postgres
//! repositories, the services that validate, persist, and publish product
//! events, and the axum REST API with JWT authentication.

pub mod api;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;

pub use error::{PlatformError, Result};
