//! Environment configuration for the outreach client.

use std::time::Duration;

/// Timeout for a single dispatch attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sender name used in templates when `OUTREACH_SENDER_NAME` is unset.
pub const DEFAULT_SENDER_NAME: &str = "The Talent Team";

#[derive(Debug, Clone)]
pub struct OutreachConfig {
    /// Base URL of the outreach service, without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub api_key: Option<String>,
    /// Name substituted for `{{sender_name}}`.
    pub sender_name: String,
    pub request_timeout: Duration,
}

impl OutreachConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `OUTREACH_API_URL` is not set, meaning the service
    /// should run with the [`DisabledGateway`](crate::DisabledGateway).
    ///
    /// | Variable               | Required | Default            |
    /// |------------------------|----------|--------------------|
    /// | `OUTREACH_API_URL`     | yes      |                    |
    /// | `OUTREACH_API_KEY`     | no       |                    |
    /// | `OUTREACH_SENDER_NAME` | no       | `The Talent Team`  |
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("OUTREACH_API_URL").ok()?;
        Self::from_values(
            &api_url,
            std::env::var("OUTREACH_API_KEY").ok(),
            std::env::var("OUTREACH_SENDER_NAME").ok(),
        )
    }

    fn from_values(
        api_url: &str,
        api_key: Option<String>,
        sender_name: Option<String>,
    ) -> Option<Self> {
        let api_url = api_url.trim().trim_end_matches('/');
        if api_url.is_empty() {
            return None;
        }
        Some(Self {
            api_url: api_url.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            sender_name: sender_name
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// `OUTREACH_SENDER_NAME`, or the default. Templates need a sender name
    /// even when delivery is disabled.
    pub fn sender_name_from_env() -> String {
        std::env::var("OUTREACH_SENDER_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string())
    }

    /// Endpoint that accepts outbound messages.
    pub fn messages_url(&self) -> String {
        format!("{}/messages", self.api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_means_disabled() {
        assert!(OutreachConfig::from_values("  ", None, None).is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = OutreachConfig::from_values("https://outreach.test/api/", None, None).unwrap();
        assert_eq!(config.messages_url(), "https://outreach.test/api/messages");
    }

    #[test]
    fn defaults_apply_for_blank_optionals() {
        let config = OutreachConfig::from_values(
            "https://outreach.test",
            Some(" ".to_string()),
            Some(String::new()),
        )
        .unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.sender_name, DEFAULT_SENDER_NAME);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
