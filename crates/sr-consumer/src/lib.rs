//! Event batching consumer.
//!
//! Drains the product-events queue, accumulates decoded events into
//! time/size-bounded batches, hands each batch to a
//! [`NotificationDispatcher`], and acknowledges or requeues every underlying
//! delivery based on the dispatch outcome:
//! - [`decode()`]: raw payload -> [`sr_common::ProductEvent`]
//! - [`BatchConsumer`]: the accumulation loop (capacity, timeout, shutdown)
//! - [`resolve()`]: maps one dispatch outcome onto every handle in the batch
//!
//! Delivery is at-least-once: a crash between a successful dispatch and the
//! acknowledgments can produce a duplicate notification, never a lost one.

pub mod batch;
pub mod consumer;
pub mod decode;
pub mod dispatch;
pub mod resolve;

pub use batch::{BatchConfig, BatchItem};
pub use consumer::BatchConsumer;
pub use decode::{decode, DecodeError};
pub use dispatch::{DispatchResult, NotificationDispatcher};
pub use resolve::resolve;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The delivery stream ended without a shutdown having been requested.
    /// The caller owns restart/backoff policy.
    #[error("delivery stream closed unexpectedly")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, ConsumerError>;
