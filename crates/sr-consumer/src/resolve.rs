//! Acknowledgment resolution for a flushed batch.

use tracing::warn;

use crate::batch::BatchItem;
use crate::dispatch::DispatchResult;

/// Apply one dispatch outcome uniformly to every handle in the batch:
/// acknowledge all on success, requeue all on failure. The dispatcher sends
/// one consolidated notification per batch, so partial acknowledgment is
/// never correct.
///
/// A broker error on an individual ack/requeue call is logged and swallowed;
/// the batch's outcome is already decided and re-dispatching a sent
/// notification would duplicate it.
pub async fn resolve(items: Vec<BatchItem>, outcome: &DispatchResult) {
    for item in items {
        match outcome {
            DispatchResult::Success => {
                if let Err(err) = item.handle.acknowledge().await {
                    warn!(sku = item.event.sku, error = %err, "acknowledge failed; delivery may be seen again");
                }
            }
            DispatchResult::Failure { .. } => {
                if let Err(err) = item.handle.requeue().await {
                    warn!(sku = item.event.sku, error = %err, "requeue failed for undelivered event");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sr_common::{EventKind, ProductEvent};
    use sr_queue::{DeliveryHandle, QueueError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandle {
        acks: Arc<AtomicUsize>,
        requeues: Arc<AtomicUsize>,
        fail_ack: bool,
    }

    #[async_trait]
    impl DeliveryHandle for CountingHandle {
        async fn acknowledge(&self) -> Result<(), QueueError> {
            self.acks.fetch_add(1, Ordering::SeqCst);
            if self.fail_ack {
                Err(QueueError::Broker(lapin::Error::ChannelsLimitReached))
            } else {
                Ok(())
            }
        }

        async fn requeue(&self) -> Result<(), QueueError> {
            self.requeues.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn item(acks: &Arc<AtomicUsize>, requeues: &Arc<AtomicUsize>, fail_ack: bool) -> BatchItem {
        BatchItem {
            event: ProductEvent::new(EventKind::Created, 1, "Desk", "ops@example.com"),
            handle: Box::new(CountingHandle {
                acks: acks.clone(),
                requeues: requeues.clone(),
                fail_ack,
            }),
        }
    }

    #[tokio::test]
    async fn success_acknowledges_every_item() {
        let acks = Arc::new(AtomicUsize::new(0));
        let requeues = Arc::new(AtomicUsize::new(0));
        let items = vec![
            item(&acks, &requeues, false),
            item(&acks, &requeues, false),
            item(&acks, &requeues, false),
        ];

        resolve(items, &DispatchResult::Success).await;

        assert_eq!(acks.load(Ordering::SeqCst), 3);
        assert_eq!(requeues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_requeues_every_item() {
        let acks = Arc::new(AtomicUsize::new(0));
        let requeues = Arc::new(AtomicUsize::new(0));
        let items = vec![item(&acks, &requeues, false), item(&acks, &requeues, false)];

        let outcome = DispatchResult::Failure {
            error: "smtp timeout".to_string(),
        };
        resolve(items, &outcome).await;

        assert_eq!(acks.load(Ordering::SeqCst), 0);
        assert_eq!(requeues.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ack_errors_never_turn_into_requeues() {
        let acks = Arc::new(AtomicUsize::new(0));
        let requeues = Arc::new(AtomicUsize::new(0));
        let items = vec![item(&acks, &requeues, true), item(&acks, &requeues, true)];

        resolve(items, &DispatchResult::Success).await;

        // every handle was attempted exactly once, and the broker errors did
        // not flip any of them onto the failure path
        assert_eq!(acks.load(Ordering::SeqCst), 2);
        assert_eq!(requeues.load(Ordering::SeqCst), 0);
    }
}
