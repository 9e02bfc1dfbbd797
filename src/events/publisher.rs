//! Import request publishing.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Connection, ConnectionProperties, ExchangeKind};
use tracing::debug;

use super::types::{ImportRequestedEvent, EXCHANGE_NAME, IMPORT_REQUESTED_KEY};

/// Errors from publishing import requests.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("broker error: {0}")]
    Broker(String),
    #[error("serialize event: {0}")]
    Serialize(String),
}

impl From<lapin::Error> for PublishError {
    fn from(e: lapin::Error) -> Self {
        Self::Broker(e.to_string())
    }
}

/// Publishes `recipe.import.requested` events.
///
/// A null-object implementation stands in when messaging is disabled, so the
/// orchestrator never branches on configuration.
#[async_trait]
pub trait ImportRequestPublisher: Send + Sync {
    async fn publish(&self, event: ImportRequestedEvent) -> Result<(), PublishError>;
}

/// AMQP-backed publisher using a topic exchange.
pub struct LapinImportPublisher {
    conn: Connection,
}

impl LapinImportPublisher {
    /// Connect to the broker and declare the durable topic exchange.
    pub async fn connect(amqp_url: &str) -> Result<Self, PublishError> {
        let conn = Connection::connect(amqp_url, ConnectionProperties::default()).await?;

        let channel = conn.create_channel().await?;
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

        Ok(Self { conn })
    }
}

#[async_trait]
impl ImportRequestPublisher for LapinImportPublisher {
    async fn publish(&self, event: ImportRequestedEvent) -> Result<(), PublishError> {
        let channel = self.conn.create_channel().await?;

        let body =
            serde_json::to_vec(&event).map_err(|e| PublishError::Serialize(e.to_string()))?;

        channel
            .basic_publish(
                EXCHANGE_NAME,
                IMPORT_REQUESTED_KEY,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(2), // persistent
            )
            .await?
            .await?;

        debug!(job_id = %event.job_id, "published recipe.import.requested");
        Ok(())
    }
}

/// No-op publisher used when no broker is configured.
pub struct NoopImportPublisher;

#[async_trait]
impl ImportRequestPublisher for NoopImportPublisher {
    async fn publish(&self, _event: ImportRequestedEvent) -> Result<(), PublishError> {
        Ok(())
    }
}
