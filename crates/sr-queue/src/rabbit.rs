//! RabbitMQ client built on lapin.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::acker::Acker;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{Delivery, DeliveryHandle, EventPublisher, QueueError, Result};

/// How many deliveries the subscription pump may hold before it stops
/// pulling from the broker socket.
const DELIVERY_BUFFER: usize = 128;

/// RabbitMQ connection plus the single channel all operations go through.
pub struct RabbitClient {
    conn: Connection,
    channel: Channel,
}

impl RabbitClient {
    /// Connect to the broker and open a channel.
    pub async fn connect(amqp_url: &str) -> Result<Self> {
        info!("connecting to RabbitMQ");
        let conn = Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        let channel = conn.create_channel().await?;
        info!("connected to RabbitMQ");
        Ok(Self { conn, channel })
    }

    /// Declare a durable queue, creating it if it does not exist.
    pub async fn declare_queue(&self, name: &str) -> Result<()> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    /// Start consuming from a queue.
    ///
    /// Deliveries are pumped into a bounded channel; the receiver closing
    /// stops the pump, and the pump ending (broker stream closed) closes the
    /// receiver, which the consumer loop treats as an unexpected stop.
    pub async fn subscribe(&self, queue: &str, consumer_tag: &str) -> Result<mpsc::Receiver<Delivery>> {
        let mut consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let queue_name = queue.to_string();

        tokio::spawn(async move {
            while let Some(next) = consumer.next().await {
                match next {
                    Ok(delivery) => {
                        let delivery = Delivery {
                            payload: delivery.data,
                            handle: Box::new(AmqpHandle { acker: delivery.acker }),
                        };
                        if tx.send(delivery).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        error!(queue = %queue_name, error = %err, "delivery stream error");
                        break;
                    }
                }
            }
            info!(queue = %queue_name, "delivery pump stopped");
        });

        Ok(rx)
    }

    /// Close the channel and connection.
    pub async fn close(&self) -> Result<()> {
        self.conn.close(0, "shutdown").await?;
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for RabbitClient {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await?
            .await?;
        Ok(())
    }
}

/// Acknowledgment handle backed by the lapin acker for one delivery.
struct AmqpHandle {
    acker: Acker,
}

#[async_trait]
impl DeliveryHandle for AmqpHandle {
    async fn acknowledge(&self) -> Result<()> {
        self.acker.ack(BasicAckOptions::default()).await.map_err(QueueError::from)
    }

    async fn requeue(&self) -> Result<()> {
        self.acker
            .nack(BasicNackOptions {
                requeue: true,
                ..Default::default()
            })
            .await
            .map_err(QueueError::from)
    }
}
