//! Import result consumption.
//!
//! Delivery is at-least-once: a message is acked only after the handler
//! completes. Recoverable failures are nacked for redelivery; unknown-job
//! results and undecodable payloads are acked and dropped so stale or
//! foreign messages cannot loop forever.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties, ExchangeKind};
use tracing::{error, info, warn};

use super::types::{ImportedEvent, EXCHANGE_NAME, IMPORTED_KEY, IMPORTED_QUEUE};
use crate::service::ServiceError;

/// Handles `recipe.imported` events.
#[async_trait]
pub trait ImportedEventHandler: Send + Sync {
    async fn handle_imported(&self, event: ImportedEvent) -> Result<(), ServiceError>;
}

#[async_trait]
impl<T: ImportedEventHandler + ?Sized> ImportedEventHandler for std::sync::Arc<T> {
    async fn handle_imported(&self, event: ImportedEvent) -> Result<(), ServiceError> {
        (**self).handle_imported(event).await
    }
}

/// Consumes `recipe.imported` events from the durable queue.
pub struct ImportedSubscriber<H> {
    conn: Connection,
    handler: H,
}

impl<H: ImportedEventHandler> ImportedSubscriber<H> {
    /// Connect to the broker.
    pub async fn connect(amqp_url: &str, handler: H) -> Result<Self, lapin::Error> {
        let conn = Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        Ok(Self { conn, handler })
    }

    /// Declare the exchange/queue/binding and consume until the channel closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        let channel = self.conn.create_channel().await?;

        channel
            .exchange_declare(
                EXCHANGE_NAME,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_declare(
                IMPORTED_QUEUE,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                IMPORTED_QUEUE,
                EXCHANGE_NAME,
                IMPORTED_KEY,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let mut consumer = channel
            .basic_consume(
                IMPORTED_QUEUE,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(queue = IMPORTED_QUEUE, "recipe.imported subscriber started");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery?;

            let event: ImportedEvent = match serde_json::from_slice(&delivery.data) {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "invalid recipe.imported payload");
                    delivery.ack(BasicAckOptions::default()).await?;
                    continue;
                }
            };

            let job_id = event.job_id;
            match self.handler.handle_imported(event).await {
                Ok(()) => {
                    delivery.ack(BasicAckOptions::default()).await?;
                }
                Err(ServiceError::JobNotFound) => {
                    // Permanently undeliverable: retrying cannot make the job appear.
                    warn!(%job_id, "dropping recipe.imported event for unknown job");
                    delivery.ack(BasicAckOptions::default()).await?;
                }
                Err(e) => {
                    error!(%job_id, error = %e, "failed to handle recipe.imported event");
                    delivery
                        .nack(BasicNackOptions {
                            requeue: true,
                            ..Default::default()
                        })
                        .await?;
                }
            }
        }

        Err(anyhow::anyhow!("recipe.imported delivery channel closed"))
    }
}
