//! Query parameter types shared by several list endpoints.

use std::str::FromStr;

use serde::Deserialize;
use talentdesk_core::error::CoreError;
use talentdesk_core::types::DbId;

/// `?job_id=&status=` filter.
///
/// `status` stays a string here so an unknown value produces the usual
/// JSON validation error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct JobStatusFilter {
    pub job_id: Option<DbId>,
    pub status: Option<String>,
}

impl JobStatusFilter {
    pub fn parsed_status<T>(&self) -> Result<Option<T>, CoreError>
    where
        T: FromStr<Err = CoreError>,
    {
        parse_optional(self.status.as_deref())
    }
}

/// Parse an optional query value; blank counts as absent.
pub fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentdesk_core::offer::OfferStatus;

    #[test]
    fn blank_status_is_absent() {
        let filter = JobStatusFilter { job_id: None, status: Some("  ".into()) };
        assert_eq!(filter.parsed_status::<OfferStatus>().unwrap(), None);
    }

    #[test]
    fn unknown_status_is_validation_error() {
        let filter = JobStatusFilter { job_id: None, status: Some("archived".into()) };
        assert!(matches!(
            filter.parsed_status::<OfferStatus>(),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn known_status_parses() {
        assert_eq!(
            parse_optional::<OfferStatus>(Some("pending_approval")).unwrap(),
            Some(OfferStatus::PendingApproval)
        );
    }
}
