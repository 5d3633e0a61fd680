//! Email address validation and the ad-hoc email log status.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::status::define_text_enum;

/// Maximum subject length accepted by `POST /emails/send`.
pub const MAX_SUBJECT_LENGTH: usize = 300;

define_text_enum! {
    /// Outcome of handing an email to the outreach service.
    EmailStatus("email status") {
        Queued = "queued",
        Sent = "sent",
        Failed = "failed",
    }
}

/// Local part, `@`, then a domain of at least two non-empty labels.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

/// Light structural check; deliverability is the outreach service's job.
pub fn validate_email_address(address: &str) -> Result<(), CoreError> {
    if EMAIL_RE.is_match(address) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid email address '{address}'"
        )))
    }
}

/// Subject must be present and bounded.
pub fn validate_subject(subject: &str) -> Result<(), CoreError> {
    if subject.trim().is_empty() {
        return Err(CoreError::Validation("Subject must not be empty".to_string()));
    }
    if subject.chars().count() > MAX_SUBJECT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Subject exceeds maximum length of {MAX_SUBJECT_LENGTH} characters"
        )));
    }
    Ok(())
}
