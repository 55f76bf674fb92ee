//! Broker publishers
//!
//! The upload worker hands finished batches to a [`Publisher`] and trusts the
//! returned count for its accounting, so a publisher must only count
//! documents the broker actually acknowledged. The AMQP implementation runs
//! with publisher confirms for exactly that reason.

use async_trait::async_trait;
use esferry_common::records::Document;
use esferry_common::{Result, TransferError};
use lapin::{
    options::*, publisher_confirm::Confirmation, types::FieldTable, BasicProperties, Channel,
    Connection, ConnectionProperties,
};
use tracing::{debug, info, warn};

// ============================================================================
// Broker Constants
// ============================================================================

/// Default AMQP endpoint when not specified via environment variable.
pub const DEFAULT_AMQP_URL: &str = "amqp://127.0.0.1:5672/%2f";

/// Default queue the records are published to.
pub const DEFAULT_AMQP_TARGET: &str = "jobmon-records";

/// Sink for finished batches
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one batch of (job id, document) pairs. Blocks until the
    /// broker has answered; returns how many documents were acknowledged.
    async fn publish(&self, batch: &[(String, Document)]) -> Result<u64>;
}

/// AMQP publisher with per-message confirms
pub struct AmqpPublisher {
    // Dropping the connection closes the channel with it; keep it owned.
    _connection: Connection,
    channel: Channel,
    target: String,
}

impl AmqpPublisher {
    /// Connect, enable publisher confirms, and declare the target queue
    pub async fn connect(url: &str, target: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| TransferError::broker(format!("failed to connect to {}: {}", url, e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| TransferError::broker(format!("failed to create channel: {}", e)))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| TransferError::broker(format!("failed to enable confirms: {}", e)))?;

        channel
            .queue_declare(
                target,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                TransferError::broker(format!("failed to declare queue '{}': {}", target, e))
            })?;

        info!(queue = target, "connected to broker with publisher confirms");

        Ok(Self {
            _connection: connection,
            channel,
            target: target.to_string(),
        })
    }
}

#[async_trait]
impl Publisher for AmqpPublisher {
    async fn publish(&self, batch: &[(String, Document)]) -> Result<u64> {
        let mut acked = 0u64;

        for (job_id, doc) in batch {
            let payload = serde_json::to_vec(doc)?;

            let confirmation = self
                .channel
                .basic_publish(
                    "",
                    &self.target,
                    BasicPublishOptions::default(),
                    &payload,
                    BasicProperties::default()
                        .with_message_id(job_id.as_str().into())
                        .with_content_type("application/json".into()),
                )
                .await
                .map_err(|e| TransferError::broker(format!("publish failed: {}", e)))?
                .await
                .map_err(|e| TransferError::broker(format!("confirm failed: {}", e)))?;

            if matches!(confirmation, Confirmation::Ack(_)) {
                acked += 1;
            } else {
                warn!(job_id = %job_id, "broker did not acknowledge message");
            }
        }

        debug!(batch = batch.len(), acked, "batch published");
        Ok(acked)
    }
}

/// Dry-run publisher: no connection, no I/O, every document counts as
/// acknowledged so the accounting invariant stays checkable end to end.
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, batch: &[(String, Document)]) -> Result<u64> {
        debug!(batch = batch.len(), "dry run, skipping publish");
        Ok(batch.len() as u64)
    }
}
