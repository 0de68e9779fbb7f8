//! Product operations: validate, persist, then publish one event per
//! successful write.

use std::collections::HashMap;
use std::sync::Arc;

use sr_common::{EventKind, ProductEvent};
use sr_queue::EventPublisher;
use tracing::{error, info, warn};

use crate::domain::Product;
use crate::error::{PlatformError, Result};
use crate::repository::ProductRepository;

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    publisher: Arc<dyn EventPublisher>,
    events_queue: String,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        publisher: Arc<dyn EventPublisher>,
        events_queue: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            publisher,
            events_queue: events_queue.into(),
        }
    }

    /// Create products in bulk. Returns a per-SKU failure map; an empty map
    /// means every product was created and announced.
    pub async fn create(&self, products: Vec<Product>, actor_email: &str) -> HashMap<i64, String> {
        let mut failures = HashMap::new();

        for product in products {
            let errors = product.validate();
            if !errors.is_empty() {
                warn!(sku = product.sku, ?errors, "rejected invalid product");
                failures.insert(product.sku, errors.join("; "));
                continue;
            }

            if let Err(err) = self.repo.insert(&product).await {
                warn!(sku = product.sku, error = %err, "failed to create product");
                failures.insert(product.sku, err.to_string());
                continue;
            }

            info!(sku = product.sku, "product created");
            self.publish_event(EventKind::Created, &product, actor_email).await;
        }

        failures
    }

    pub async fn get_all(&self) -> Result<Vec<Product>> {
        self.repo.fetch_all().await
    }

    pub async fn get_by_sku(&self, sku: i64) -> Result<Product> {
        self.repo
            .fetch_by_sku(sku)
            .await?
            .ok_or_else(|| PlatformError::not_found("product", sku))
    }

    /// Update products in bulk. Every product must exist before anything is
    /// written; a missing SKU aborts the whole batch.
    pub async fn update(&self, products: Vec<Product>, actor_email: &str) -> HashMap<i64, String> {
        for product in &products {
            match self.repo.fetch_by_sku(product.sku).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(sku = product.sku, "cannot update non-existent product");
                    return HashMap::from([(
                        product.sku,
                        format!("product with SKU {} not found", product.sku),
                    )]);
                }
                Err(err) => {
                    return HashMap::from([(product.sku, err.to_string())]);
                }
            }
        }

        let mut failures = HashMap::new();
        for product in products {
            let errors = product.validate();
            if !errors.is_empty() {
                warn!(sku = product.sku, ?errors, "rejected invalid product update");
                failures.insert(product.sku, errors.join("; "));
                continue;
            }

            if let Err(err) = self.repo.update(&product).await {
                warn!(sku = product.sku, error = %err, "failed to update product");
                failures.insert(product.sku, err.to_string());
                continue;
            }

            info!(sku = product.sku, "product updated");
            self.publish_event(EventKind::Updated, &product, actor_email).await;
        }

        failures
    }

    /// Delete products by SKU. Missing SKUs are reported per item; the rest
    /// are still deleted.
    pub async fn delete(&self, skus: Vec<i64>, actor_email: &str) -> HashMap<i64, String> {
        let mut failures = HashMap::new();

        for sku in skus {
            let product = match self.repo.fetch_by_sku(sku).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    warn!(sku, "cannot delete non-existent product");
                    failures.insert(sku, format!("product with SKU {sku} not found"));
                    continue;
                }
                Err(err) => {
                    failures.insert(sku, err.to_string());
                    continue;
                }
            };

            match self.repo.delete(sku).await {
                Ok(true) => {
                    info!(sku, "product deleted");
                    self.publish_event(EventKind::Deleted, &product, actor_email).await;
                }
                Ok(false) => {
                    failures.insert(sku, format!("product with SKU {sku} not found"));
                }
                Err(err) => {
                    warn!(sku, error = %err, "failed to delete product");
                    failures.insert(sku, err.to_string());
                }
            }
        }

        failures
    }

    /// Announce one write on the events queue. The write has already
    /// committed, so a publish failure is logged and swallowed rather than
    /// failing the request.
    async fn publish_event(&self, kind: EventKind, product: &Product, actor_email: &str) {
        let event = ProductEvent::new(kind, product.sku, product.name.clone(), actor_email);
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(err) => {
                error!(sku = product.sku, error = %err, "failed to serialize product event");
                return;
            }
        };

        if let Err(err) = self.publisher.publish(&self.events_queue, &payload).await {
            error!(sku = product.sku, error = %err, "failed to publish product event");
            return;
        }

        info!(sku = product.sku, kind = ?kind, queue = %self.events_queue, "published product event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use sr_queue::QueueError;

    use crate::domain::AVAILABILITY_IN_STOCK;

    #[derive(Default)]
    struct MemoryProducts {
        items: Mutex<HashMap<i64, Product>>,
    }

    #[async_trait]
    impl ProductRepository for MemoryProducts {
        async fn insert(&self, product: &Product) -> Result<()> {
            let mut items = self.items.lock();
            if items.contains_key(&product.sku) {
                return Err(PlatformError::duplicate("product", product.sku));
            }
            items.insert(product.sku, product.clone());
            Ok(())
        }

        async fn fetch_all(&self) -> Result<Vec<Product>> {
            let mut all: Vec<Product> = self.items.lock().values().cloned().collect();
            all.sort_by_key(|p| p.sku);
            Ok(all)
        }

        async fn fetch_by_sku(&self, sku: i64) -> Result<Option<Product>> {
            Ok(self.items.lock().get(&sku).cloned())
        }

        async fn update(&self, product: &Product) -> Result<()> {
            let mut items = self.items.lock();
            if !items.contains_key(&product.sku) {
                return Err(PlatformError::not_found("product", product.sku));
            }
            items.insert(product.sku, product.clone());
            Ok(())
        }

        async fn delete(&self, sku: i64) -> Result<bool> {
            Ok(self.items.lock().remove(&sku).is_some())
        }
    }

    #[derive(Default)]
    struct MemoryPublisher {
        published: Mutex<Vec<(String, ProductEvent)>>,
        fail: bool,
    }

    #[async_trait]
    impl EventPublisher for MemoryPublisher {
        async fn publish(&self, queue: &str, payload: &[u8]) -> sr_queue::Result<()> {
            if self.fail {
                return Err(QueueError::Broker(lapin::Error::ChannelsLimitReached));
            }
            let event: ProductEvent = serde_json::from_slice(payload).unwrap();
            self.published.lock().push((queue.to_string(), event));
            Ok(())
        }
    }

    fn product(sku: i64) -> Product {
        Product {
            sku,
            name: format!("Product {sku}"),
            description: String::new(),
            price: 10.0,
            category: "General".to_string(),
            link: None,
            image_link: None,
            availability: AVAILABILITY_IN_STOCK.to_string(),
            created_by: "tester".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(
        repo: Arc<MemoryProducts>,
        publisher: Arc<MemoryPublisher>,
    ) -> ProductService {
        ProductService::new(repo, publisher, "product_events")
    }

    #[tokio::test]
    async fn create_publishes_one_event_per_success() {
        let repo = Arc::new(MemoryProducts::default());
        let publisher = Arc::new(MemoryPublisher::default());
        let svc = service(repo.clone(), publisher.clone());

        let failures = svc
            .create(vec![product(1), product(2)], "ops@example.com")
            .await;
        assert!(failures.is_empty());

        let published = publisher.published.lock();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "product_events");
        assert_eq!(published[0].1.kind, EventKind::Created);
        assert_eq!(published[0].1.notify_address, "ops@example.com");
    }

    #[tokio::test]
    async fn create_skips_invalid_and_duplicate_products() {
        let repo = Arc::new(MemoryProducts::default());
        let publisher = Arc::new(MemoryPublisher::default());
        let svc = service(repo.clone(), publisher.clone());

        let mut invalid = product(3);
        invalid.price = 0.0;

        // seed sku 1 so the second insert collides
        assert!(svc.create(vec![product(1)], "ops@example.com").await.is_empty());

        let failures = svc
            .create(vec![product(1), invalid, product(2)], "ops@example.com")
            .await;
        assert_eq!(failures.len(), 2);
        assert!(failures.contains_key(&1));
        assert!(failures.contains_key(&3));

        // one event from the seed, one from sku 2; nothing for the failures
        assert_eq!(publisher.published.lock().len(), 2);
    }

    #[tokio::test]
    async fn update_aborts_when_any_product_is_missing() {
        let repo = Arc::new(MemoryProducts::default());
        let publisher = Arc::new(MemoryPublisher::default());
        let svc = service(repo.clone(), publisher.clone());

        assert!(svc.create(vec![product(1)], "ops@example.com").await.is_empty());
        publisher.published.lock().clear();

        let failures = svc
            .update(vec![product(1), product(99)], "ops@example.com")
            .await;
        assert_eq!(failures.len(), 1);
        assert!(failures[&99].contains("not found"));

        // nothing was written or announced
        assert!(publisher.published.lock().is_empty());
    }

    #[tokio::test]
    async fn delete_publishes_for_deleted_and_reports_missing() {
        let repo = Arc::new(MemoryProducts::default());
        let publisher = Arc::new(MemoryPublisher::default());
        let svc = service(repo.clone(), publisher.clone());

        assert!(svc.create(vec![product(1)], "ops@example.com").await.is_empty());
        publisher.published.lock().clear();

        let failures = svc.delete(vec![1, 42], "ops@example.com").await;
        assert_eq!(failures.len(), 1);
        assert!(failures.contains_key(&42));

        let published = publisher.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.kind, EventKind::Deleted);
        assert_eq!(published[0].1.sku, 1);
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_the_write() {
        let repo = Arc::new(MemoryProducts::default());
        let publisher = Arc::new(MemoryPublisher {
            fail: true,
            ..Default::default()
        });
        let svc = service(repo.clone(), publisher.clone());

        let failures = svc.create(vec![product(1)], "ops@example.com").await;
        assert!(failures.is_empty());
        assert!(svc.get_by_sku(1).await.is_ok());
    }

    #[tokio::test]
    async fn get_by_sku_maps_missing_to_not_found() {
        let repo = Arc::new(MemoryProducts::default());
        let publisher = Arc::new(MemoryPublisher::default());
        let svc = service(repo, publisher);

        let err = svc.get_by_sku(123).await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }
}
