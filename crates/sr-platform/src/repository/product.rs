//! Product repository backed by Postgres.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::Product;
use crate::error::{PlatformError, Result};
use crate::repository::ProductRepository;

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                sku BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                price DOUBLE PRECISION NOT NULL,
                category TEXT NOT NULL,
                link TEXT,
                image_link TEXT,
                availability TEXT NOT NULL,
                created_by TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_product(row: &PgRow) -> Product {
    Product {
        sku: row.get("sku"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        category: row.get("category"),
        link: row.get("link"),
        image_link: row.get("image_link"),
        availability: row.get("availability"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn insert(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO products
                (sku, name, description, price, category, link, image_link, availability, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.link)
        .bind(&product.image_link)
        .bind(&product.availability)
        .bind(&product.created_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(PlatformError::duplicate("product", product.sku))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY sku")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn fetch_by_sku(&self, sku: i64) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_product))
    }

    async fn update(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, category = $5,
                link = $6, image_link = $7, availability = $8, updated_at = $9
            WHERE sku = $1
            "#,
        )
        .bind(product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.link)
        .bind(&product.image_link)
        .bind(&product.availability)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PlatformError::not_found("product", product.sku));
        }
        Ok(())
    }

    async fn delete(&self, sku: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE sku = $1")
            .bind(sku)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
