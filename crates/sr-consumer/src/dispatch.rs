//! Notification dispatch boundary consumed by the batching loop.

use async_trait::async_trait;
use sr_common::ProductEvent;

/// Outcome of one consolidated notification attempt. Transport details
/// (timeouts, auth failures, bad addresses) all collapse to `Failure`.
#[derive(Debug, Clone)]
pub enum DispatchResult {
    Success,
    Failure { error: String },
}

/// Delivers one consolidated notification for a batch of events.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// `events` is never empty and preserves queue delivery order.
    async fn dispatch(&self, events: &[ProductEvent]) -> DispatchResult;
}
