//! Sourced-candidate status and search criteria.

use serde::Deserialize;

use crate::error::CoreError;
use crate::status::define_text_enum;
use crate::types::DbId;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: i64 = 25;

/// Upper bound on search results.
pub const MAX_SEARCH_LIMIT: i64 = 100;

define_text_enum! {
    /// Pipeline status of a sourced prospect.
    ///
    /// Recruiters move candidates freely between these; only membership is
    /// enforced.
    CandidateStatus("candidate status") {
        New = "new",
        Contacted = "contacted",
        Replied = "replied",
        Interested = "interested",
        NotInterested = "not_interested",
        Converted = "converted",
        Rejected = "rejected",
    }
}

/// Body of `POST /sourcing/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteria {
    /// Free-text terms matched against name, headline and company.
    #[serde(default)]
    pub keywords: Option<String>,
    /// Candidates must have at least one of these skills.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Rank against this job's skills matrix.
    #[serde(default)]
    pub job_id: Option<DbId>,
    #[serde(default)]
    pub min_fit_score: Option<i32>,
    #[serde(default)]
    pub limit: Option<i64>,
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl SearchCriteria {
    /// A search must constrain something.
    pub fn validate(&self) -> Result<(), CoreError> {
        let has_skill = self.skills.iter().any(|s| !s.trim().is_empty());
        if !non_blank(&self.keywords) && !has_skill && !non_blank(&self.location) && self.job_id.is_none() {
            return Err(CoreError::Validation(
                "Provide keywords, skills, a location or a job to search for".to_string(),
            ));
        }
        if let Some(score) = self.min_fit_score {
            if !(0..=100).contains(&score) {
                return Err(CoreError::Validation(
                    "min_fit_score must be between 0 and 100".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The limit clamped to `1..=MAX_SEARCH_LIMIT`.
    pub fn clamped_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }

    /// Skills trimmed and lowercased, blanks dropped.
    pub fn normalized_skills(&self) -> Vec<String> {
        self.skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Split a display name into `(first, last)` on the first space.
pub fn split_name(full_name: &str) -> (String, String) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Fit scores are percentages.
pub fn validate_fit_score(score: i32) -> Result<(), CoreError> {
    if (0..=100).contains(&score) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Fit score {score} is out of range (0-100)"
        )))
    }
}
