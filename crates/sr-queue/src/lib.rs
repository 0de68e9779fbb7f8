//! Queue boundary for Stockroom.
//!
//! Wraps the RabbitMQ client behind two small capabilities:
//! - [`EventPublisher`]: fire a payload at a named queue (used by the
//!   platform services after a successful write).
//! - [`Delivery`] / [`DeliveryHandle`]: one received message paired with the
//!   broker handle that can acknowledge it or put it back on the queue.
//!
//! The consumer core never sees lapin types; it works against the handle
//! trait so tests can drive it with in-memory fakes.

pub mod rabbit;

pub use rabbit::RabbitClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Publishes event payloads to a named queue.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()>;
}

/// Acknowledgment handle for one delivery.
///
/// Exactly one of `acknowledge` or `requeue` must eventually be called for
/// every delivery handed out; `requeue` asks the broker to redeliver rather
/// than discard.
#[async_trait]
pub trait DeliveryHandle: Send + Sync {
    async fn acknowledge(&self) -> Result<()>;
    async fn requeue(&self) -> Result<()>;
}

/// One message received from the queue: the raw payload plus its handle.
pub struct Delivery {
    pub payload: Vec<u8>,
    pub handle: Box<dyn DeliveryHandle>,
}
