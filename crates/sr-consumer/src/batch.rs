//! Batch building blocks.

use sr_common::ProductEvent;
use sr_queue::DeliveryHandle;
use std::time::Duration;

/// Bounds for one batch. Read once at consumer construction and immutable
/// for the consumer's lifetime.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Max items before a forced flush.
    pub capacity: usize,
    /// Max age of a non-empty batch before a forced flush, measured from
    /// the batch's first item.
    pub timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            timeout: Duration::from_secs(5),
        }
    }
}

/// One decoded event paired with the delivery handle that must be resolved
/// once the batch's outcome is known.
pub struct BatchItem {
    pub event: ProductEvent,
    pub handle: Box<dyn DeliveryHandle>,
}
