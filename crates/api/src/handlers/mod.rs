pub mod assessments;
pub mod auth;
pub mod campaigns;
pub mod emails;
pub mod jobs;
pub mod offers;
pub mod outreach;
pub mod phone_interviews;
pub mod sourcing;

use talentdesk_core::error::CoreError;

/// Reject blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
