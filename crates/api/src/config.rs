use talentdesk_outreach::OutreachConfig;

use crate::auth::jwt::JwtConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines (default).
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Defaults suit local development; override them in production.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Proof-of-concept mode: every request runs as an admin operator.
    pub auth_disabled: bool,
    pub log_format: LogFormat,
    /// Hiring company named in outreach and offer emails.
    pub company_name: String,
    /// Signature used for `{{sender_name}}`.
    pub sender_name: String,
    /// Shared secret the outreach service presents on delivery callbacks.
    /// Callbacks are accepted unauthenticated when unset.
    pub outreach_callback_key: Option<String>,
    pub jwt: JwtConfig,
}

/// Interpret common truthy spellings.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `AUTH_DISABLED`        | `false`                    |
    /// | `LOG_FORMAT`           | `pretty` (`json` accepted) |
    /// | `COMPANY_NAME`         | `Talentdesk`               |
    /// | `OUTREACH_SENDER_NAME` | `The Talent Team`          |
    /// | `OUTREACH_API_KEY`     | unset                      |
    ///
    /// `JWT_SECRET` is required unless `AUTH_DISABLED` is on, in which case
    /// a throwaway secret is generated.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let auth_disabled = std::env::var("AUTH_DISABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let log_format = std::env::var("LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or(LogFormat::Pretty);

        let company_name = std::env::var("COMPANY_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Talentdesk".into());

        let outreach_callback_key = std::env::var("OUTREACH_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let jwt = match std::env::var("JWT_SECRET") {
            Err(_) if auth_disabled => JwtConfig::ephemeral(),
            _ => JwtConfig::from_env(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            auth_disabled,
            log_format,
            company_name,
            sender_name: OutreachConfig::sender_name_from_env(),
            outreach_callback_key,
            jwt,
        }
    }
}
