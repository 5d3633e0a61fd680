//! Phone interview access tokens.
//!
//! Candidates reach their interview through a public link carrying an
//! unguessable token instead of a login.

use rand::Rng;

use crate::error::CoreError;
use crate::status::define_text_enum;
use crate::types::Timestamp;

/// Length of a generated interview token.
pub const TOKEN_LENGTH: usize = 32;

/// Default validity of an interview link.
pub const DEFAULT_LINK_VALIDITY_DAYS: i64 = 7;

define_text_enum! {
    /// Phone interview progress.
    InterviewStatus("interview status") {
        Scheduled = "scheduled",
        InProgress = "in_progress",
        Completed = "completed",
        Expired = "expired",
        Cancelled = "cancelled",
    }
}

impl InterviewStatus {
    /// Whether the candidate may still use the link.
    pub fn is_open(self) -> bool {
        matches!(self, InterviewStatus::Scheduled | InterviewStatus::InProgress)
    }
}

/// Generate a random alphanumeric token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Reject anything that could not have come from [`generate_token`].
pub fn validate_token_format(token: &str) -> Result<(), CoreError> {
    if token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(CoreError::Validation("Malformed interview token".to_string()))
    }
}

/// Whether a link with `expires_at` is expired at `now`.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now >= expires_at
}
