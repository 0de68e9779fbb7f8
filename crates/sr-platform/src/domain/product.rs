//! Product domain model and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const AVAILABILITY_IN_STOCK: &str = "in stock";
pub const AVAILABILITY_OUT_OF_STOCK: &str = "out of stock";

/// A catalog product. The SKU is chosen by the caller and is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub sku: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_link: Option<String>,
    pub availability: String,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Field-level validation.
    ///
    /// Returns an empty `Vec` if valid; otherwise a list of human-readable
    /// errors.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sku <= 0 {
            errors.push("sku must be a positive integer".to_string());
        }
        if self.name.chars().count() < 3 || self.name.chars().count() > 100 {
            errors.push("name must be between 3 and 100 characters".to_string());
        }
        if self.description.chars().count() > 500 {
            errors.push("description must be at most 500 characters".to_string());
        }
        if !(self.price > 0.0) {
            errors.push("price must be greater than zero".to_string());
        }
        if self.category.chars().count() < 3 || self.category.chars().count() > 100 {
            errors.push("category must be between 3 and 100 characters".to_string());
        }
        if let Some(link) = &self.link {
            if !looks_like_url(link) {
                errors.push("link must be a valid http(s) URL".to_string());
            }
        }
        if let Some(link) = &self.image_link {
            if !looks_like_url(link) {
                errors.push("image_link must be a valid http(s) URL".to_string());
            }
        }
        if self.availability != AVAILABILITY_IN_STOCK && self.availability != AVAILABILITY_OUT_OF_STOCK
        {
            errors.push(format!(
                "availability must be '{AVAILABILITY_IN_STOCK}' or '{AVAILABILITY_OUT_OF_STOCK}'"
            ));
        }

        errors
    }
}

fn looks_like_url(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://")) && value.len() > 8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_product() -> Product {
        Product {
            sku: 1001,
            name: "Standing Desk".to_string(),
            description: "Height adjustable".to_string(),
            price: 499.90,
            category: "Furniture".to_string(),
            link: Some("https://shop.example.com/desk".to_string()),
            image_link: None,
            availability: AVAILABILITY_IN_STOCK.to_string(),
            created_by: "ops".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(valid_product().validate().is_empty());
    }

    #[test]
    fn rejects_bad_sku_price_and_availability() {
        let mut p = valid_product();
        p.sku = 0;
        p.price = 0.0;
        p.availability = "backordered".to_string();
        let errors = p.validate();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_non_url_link() {
        let mut p = valid_product();
        p.link = Some("not-a-url".to_string());
        assert_eq!(p.validate().len(), 1);
    }

    #[test]
    fn rejects_short_name() {
        let mut p = valid_product();
        p.name = "ab".to_string();
        assert_eq!(p.validate().len(), 1);
    }
}
