//! Stockroom Notifier
//!
//! Consumes product events from the queue, accumulates them into
//! time/size-bounded batches, and sends one summary email per batch.
//! Requested shutdown (Ctrl+C/SIGTERM) drains the in-flight batch and exits
//! cleanly; an unexpectedly closed delivery stream exits with an error so a
//! supervisor can apply restart/backoff policy.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SR_AMQP_URL` | - | RabbitMQ connection URL (required) |
//! | `SR_QUEUE_NAME` | `product_events` | Events queue name |
//! | `SR_BATCH_CAPACITY` | `100` | Max events per batch |
//! | `SR_BATCH_TIMEOUT_MS` | `5000` | Max age of a non-empty batch |
//! | `SMTP_HOST` | - | SMTP server hostname (required) |
//! | `SMTP_PORT` | `587` | SMTP server port |
//! | `SMTP_FROM` | - | Sender address (required) |
//! | `SMTP_USER` | - | Optional SMTP username |
//! | `SMTP_PASSWORD` | - | Optional SMTP password |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sr_common::DEFAULT_EVENTS_QUEUE;
use sr_consumer::{BatchConfig, BatchConsumer};
use sr_mailer::{EmailNotifier, SmtpConfig};
use sr_queue::RabbitClient;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{} environment variable is required", key))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Stockroom notifier");

    let amqp_url = env_required("SR_AMQP_URL")?;
    let queue_name = env_or("SR_QUEUE_NAME", DEFAULT_EVENTS_QUEUE);
    let capacity: usize = env_or_parse("SR_BATCH_CAPACITY", 100);
    let timeout_ms: u64 = env_or_parse("SR_BATCH_TIMEOUT_MS", 5_000);

    let smtp = SmtpConfig::from_env()
        .ok_or_else(|| anyhow::anyhow!("SMTP_HOST and SMTP_FROM environment variables are required"))?;
    let notifier = Arc::new(EmailNotifier::new(smtp)?);

    let rabbit = RabbitClient::connect(&amqp_url).await?;
    rabbit.declare_queue(&queue_name).await?;
    let deliveries = rabbit.subscribe(&queue_name, "sr-notifier").await?;
    info!(queue = %queue_name, "subscribed to events queue");

    let consumer = BatchConsumer::new(
        BatchConfig {
            capacity,
            timeout: Duration::from_millis(timeout_ms),
        },
        notifier,
    );

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            shutdown.cancel();
        });
    }

    let result = consumer.run(deliveries, shutdown).await;
    rabbit.close().await.ok();

    match result {
        Ok(()) => {
            info!("Stockroom notifier shutdown complete");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
