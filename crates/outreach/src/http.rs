//! HTTP implementation of [`OutreachGateway`] with backoff retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OutreachConfig;
use crate::gateway::{DispatchReceipt, OutboundMessage, OutreachGateway};
use crate::OutreachError;

/// Delays before each retry (1 s, then 2 s).
const RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

/// Body the service answers with on success.
#[derive(Debug, Deserialize)]
struct AcceptedMessage {
    id: String,
}

/// Posts messages to `{OUTREACH_API_URL}/messages`.
pub struct HttpOutreachGateway {
    client: reqwest::Client,
    config: OutreachConfig,
    retry_delays: Vec<Duration>,
}

impl HttpOutreachGateway {
    pub fn new(config: OutreachConfig) -> Result<Self, OutreachError> {
        Self::with_retry_delays(config, RETRY_DELAYS.to_vec())
    }

    /// Build a gateway with custom backoff. An empty list disables retry.
    pub fn with_retry_delays(
        config: OutreachConfig,
        retry_delays: Vec<Duration>,
    ) -> Result<Self, OutreachError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            retry_delays,
        })
    }

    /// A single POST. Client errors other than 429 are not worth retrying
    /// and are flagged as such.
    async fn try_send(&self, message: &OutboundMessage) -> Result<DispatchReceipt, (OutreachError, bool)> {
        let mut request = self.client.post(self.config.messages_url()).json(message);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| (OutreachError::from(e), true))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let retryable = status.is_server_error() || status.as_u16() == 429;
            return Err((
                OutreachError::HttpStatus {
                    status: status.as_u16(),
                    body,
                },
                retryable,
            ));
        }

        let accepted: AcceptedMessage = response
            .json()
            .await
            .map_err(|e| (OutreachError::InvalidResponse(e.to_string()), false))?;
        Ok(DispatchReceipt {
            external_id: accepted.id,
        })
    }
}

#[async_trait]
impl OutreachGateway for HttpOutreachGateway {
    async fn dispatch(&self, message: &OutboundMessage) -> Result<DispatchReceipt, OutreachError> {
        let mut delays = self.retry_delays.iter();
        let mut attempt = 1;
        loop {
            match self.try_send(message).await {
                Ok(receipt) => {
                    tracing::debug!(
                        message_id = %message.message_id,
                        external_id = %receipt.external_id,
                        attempt,
                        "Outreach message accepted"
                    );
                    return Ok(receipt);
                }
                Err((e, retryable)) => match delays.next() {
                    Some(delay) if retryable => {
                        tracing::warn!(
                            message_id = %message.message_id,
                            attempt,
                            error = %e,
                            "Outreach dispatch failed, retrying"
                        );
                        tokio::time::sleep(*delay).await;
                        attempt += 1;
                    }
                    _ => {
                        tracing::error!(
                            message_id = %message.message_id,
                            attempt,
                            error = %e,
                            "Outreach dispatch failed"
                        );
                        return Err(e);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config(url: &str) -> OutreachConfig {
        OutreachConfig {
            api_url: url.to_string(),
            api_key: Some("secret".to_string()),
            sender_name: "Recruiting".to_string(),
            request_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn new_builds_client() {
        assert!(HttpOutreachGateway::new(config("https://outreach.test")).is_ok());
    }

    #[test]
    fn http_status_error_display() {
        let err = OutreachError::HttpStatus {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Outreach service returned HTTP 503: busy");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_request_error() {
        // Port 9 (discard) is closed on test hosts; no retries keeps this fast.
        let gateway =
            HttpOutreachGateway::with_retry_delays(config("http://127.0.0.1:9"), Vec::new()).unwrap();
        let message = OutboundMessage {
            message_id: "t-1".to_string(),
            to: "a@example.com".to_string(),
            subject: None,
            body: "hi".to_string(),
            channel: "email".to_string(),
            metadata: serde_json::Value::Null,
        };
        assert_matches!(gateway.dispatch(&message).await, Err(OutreachError::Request(_)));
        assert!(gateway.is_live());
    }
}
