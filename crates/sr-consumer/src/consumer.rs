//! The batch accumulation loop.

use std::pin::Pin;
use std::sync::Arc;

use sr_common::ProductEvent;
use sr_queue::Delivery;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch::{BatchConfig, BatchItem};
use crate::decode::decode;
use crate::dispatch::{DispatchResult, NotificationDispatcher};
use crate::resolve::resolve;
use crate::{ConsumerError, Result};

/// Owns one working batch and the timer that bounds its age.
///
/// The loop multiplexes three wake sources, evaluated in priority order per
/// iteration: shutdown request, next delivery, timer expiry. Exactly one
/// task owns accumulation, so the batch itself needs no locking; multiple
/// consumer processes may still compete on the same queue, arbitrated by the
/// broker.
pub struct BatchConsumer {
    config: BatchConfig,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl BatchConsumer {
    pub fn new(config: BatchConfig, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Run until shutdown is requested or the delivery stream ends.
    ///
    /// A requested shutdown drains the in-flight batch and returns `Ok(())`.
    /// The stream closing without a shutdown request also drains, then
    /// returns [`ConsumerError::StreamClosed`]; restart/backoff is the
    /// caller's decision.
    pub async fn run(
        &self,
        mut deliveries: mpsc::Receiver<Delivery>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!(
            capacity = self.config.capacity,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "consumer started, waiting for events"
        );

        let mut batch: Vec<BatchItem> = Vec::with_capacity(self.config.capacity);
        let timer = sleep(self.config.timeout);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    if !batch.is_empty() {
                        self.flush(&mut batch, timer.as_mut()).await;
                    }
                    info!("consumer stopped: shutdown requested");
                    return Ok(());
                }

                received = deliveries.recv() => {
                    let Some(delivery) = received else {
                        warn!("delivery stream closed");
                        if !batch.is_empty() {
                            self.flush(&mut batch, timer.as_mut()).await;
                        }
                        return Err(ConsumerError::StreamClosed);
                    };
                    self.accept(delivery, &mut batch, timer.as_mut()).await;
                    if batch.len() >= self.config.capacity {
                        self.flush(&mut batch, timer.as_mut()).await;
                    }
                }

                _ = timer.as_mut() => {
                    if batch.is_empty() {
                        timer.as_mut().reset(Instant::now() + self.config.timeout);
                    } else {
                        self.flush(&mut batch, timer.as_mut()).await;
                    }
                }
            }
        }
    }

    /// Decode one delivery into the working batch.
    ///
    /// A payload that fails to decode is requeued immediately and leaves the
    /// batch untouched: it does not count toward capacity and does not
    /// restart the timer.
    async fn accept(
        &self,
        delivery: Delivery,
        batch: &mut Vec<BatchItem>,
        timer: Pin<&mut Sleep>,
    ) {
        let event = match decode(&delivery.payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "undecodable delivery; returning it to the queue");
                if let Err(err) = delivery.handle.requeue().await {
                    warn!(error = %err, "requeue failed for undecodable delivery");
                }
                return;
            }
        };

        if batch.is_empty() {
            // batch age runs from its first item, not from loop start
            timer.reset(Instant::now() + self.config.timeout);
        }

        debug!(sku = event.sku, kind = ?event.kind, batch_size = batch.len() + 1, "event added to batch");
        batch.push(BatchItem {
            event,
            handle: delivery.handle,
        });
    }

    /// Close the batch, dispatch it, and resolve every handle.
    ///
    /// Taking the items and re-arming the timer happen as one step, so a
    /// size-triggered flush can never leave a stale deadline that fires on
    /// the empty successor batch.
    async fn flush(&self, batch: &mut Vec<BatchItem>, timer: Pin<&mut Sleep>) {
        let items = std::mem::take(batch);
        timer.reset(Instant::now() + self.config.timeout);
        if items.is_empty() {
            return;
        }

        let events: Vec<ProductEvent> = items.iter().map(|item| item.event.clone()).collect();

        // The batch is addressed from its first item. A window with no
        // address has nowhere to go; retrying would not change that, so it
        // resolves as delivered.
        let outcome = if events[0].notify_address.is_empty() {
            warn!(batch_size = events.len(), "no notify address on batch; skipping notification");
            DispatchResult::Success
        } else {
            self.dispatcher.dispatch(&events).await
        };

        match &outcome {
            DispatchResult::Success => {
                info!(batch_size = events.len(), "batch resolved, acknowledging deliveries");
            }
            DispatchResult::Failure { error } => {
                warn!(batch_size = events.len(), error = %error, "notification dispatch failed; requeueing batch");
            }
        }

        resolve(items, &outcome).await;
    }
}
