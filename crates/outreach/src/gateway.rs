//! The gateway abstraction and the offline stand-in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::OutreachError;

/// A message ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    /// Caller-chosen idempotency key, e.g. `campaign-3-message-17`.
    pub message_id: String,
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
    /// `email`, `linkedin` or `sms`.
    pub channel: String,
    /// Free-form context echoed back in delivery callbacks.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// Acknowledgement from the outreach service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// The service's own message ID. Delivery callbacks refer to it.
    pub external_id: String,
}

/// Anything that can hand a message over for delivery.
#[async_trait]
pub trait OutreachGateway: Send + Sync {
    async fn dispatch(&self, message: &OutboundMessage) -> Result<DispatchReceipt, OutreachError>;

    /// Whether messages actually leave the system.
    fn is_live(&self) -> bool {
        true
    }
}

/// Gateway used when no outreach service is configured.
///
/// Nothing is delivered. Each dispatch is logged and acknowledged with a
/// synthetic `local-<uuid>` ID so the rest of the workflow proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl OutreachGateway for DisabledGateway {
    async fn dispatch(&self, message: &OutboundMessage) -> Result<DispatchReceipt, OutreachError> {
        let external_id = format!("local-{}", uuid::Uuid::new_v4());
        tracing::info!(
            message_id = %message.message_id,
            channel = %message.channel,
            to = %message.to,
            %external_id,
            "Outreach disabled, message not delivered"
        );
        Ok(DispatchReceipt { external_id })
    }

    fn is_live(&self) -> bool {
        false
    }
}
