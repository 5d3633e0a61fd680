//! Job posting enums, JSONB payload types and validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::define_text_enum;

/// Maximum length of a job title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Accepted range for a skill weight.
pub const MIN_SKILL_WEIGHT: i32 = 1;
pub const MAX_SKILL_WEIGHT: i32 = 10;

/// Weight assumed when a skill requirement does not specify one.
pub const DEFAULT_SKILL_WEIGHT: i32 = 5;

define_text_enum! {
    /// Lifecycle of a job posting.
    JobStatus("job status") {
        Draft = "draft",
        Active = "active",
        Paused = "paused",
        Closed = "closed",
        Filled = "filled",
    }
}

define_text_enum! {
    /// Employment type.
    JobType("job type") {
        FullTime = "full_time",
        PartTime = "part_time",
        Contract = "contract",
        Internship = "internship",
        Temporary = "temporary",
    }
}

define_text_enum! {
    /// Where the work happens.
    RemotePolicy("remote policy") {
        Onsite = "onsite",
        Hybrid = "hybrid",
        Remote = "remote",
    }
}

// ---------------------------------------------------------------------------
// JSONB payloads
// ---------------------------------------------------------------------------

fn default_weight() -> i32 {
    DEFAULT_SKILL_WEIGHT
}

/// One skill the job asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    /// Free-form level such as `"expert"` or `"intermediate"`.
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: i32,
}

impl SkillRequirement {
    pub fn new(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            proficiency: None,
            weight: DEFAULT_SKILL_WEIGHT,
        }
    }
}

/// Required and nice-to-have skills, persisted in `jobs.skills_matrix`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsMatrix {
    #[serde(default)]
    pub required: Vec<SkillRequirement>,
    #[serde(default)]
    pub nice_to_have: Vec<SkillRequirement>,
}

impl SkillsMatrix {
    /// True when neither list has any entries.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.nice_to_have.is_empty()
    }

    /// Every skill name in the matrix, required first.
    pub fn all_skills(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .chain(self.nice_to_have.iter())
            .map(|r| r.skill.as_str())
    }

    /// Skills must be non-blank, weights in range, and no skill may appear
    /// twice across both lists (compared case-insensitively).
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for req in self.required.iter().chain(self.nice_to_have.iter()) {
            let key = req.skill.trim().to_lowercase();
            if key.is_empty() {
                return Err(CoreError::Validation(
                    "Skill names must not be empty".to_string(),
                ));
            }
            if !(MIN_SKILL_WEIGHT..=MAX_SKILL_WEIGHT).contains(&req.weight) {
                return Err(CoreError::Validation(format!(
                    "Weight for skill '{}' must be between {MIN_SKILL_WEIGHT} and {MAX_SKILL_WEIGHT}",
                    req.skill
                )));
            }
            if !seen.insert(key) {
                return Err(CoreError::Validation(format!(
                    "Skill '{}' is listed more than once",
                    req.skill
                )));
            }
        }
        Ok(())
    }
}

/// Advertised compensation band, persisted in `jobs.salary_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
    pub currency: String,
}

impl SalaryRange {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.min < 0 || self.max < 0 {
            return Err(CoreError::Validation(
                "Salary values must not be negative".to_string(),
            ));
        }
        if self.min > self.max {
            return Err(CoreError::Validation(format!(
                "Salary minimum ({}) exceeds maximum ({})",
                self.min, self.max
            )));
        }
        crate::offer::validate_currency(&self.currency)
    }
}

/// Validate a job title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Job title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Job title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Statuses reachable from `from`. `Filled` is terminal.
pub fn valid_transitions(from: JobStatus) -> &'static [JobStatus] {
    use JobStatus::*;
    match from {
        Draft => &[Active, Closed],
        Active => &[Paused, Closed, Filled],
        Paused => &[Active, Closed],
        Closed => &[Active],
        Filled => &[],
    }
}

pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    valid_transitions(from).contains(&to)
}

pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Job cannot move from {from} to {to}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn matrix(required: &[&str], nice: &[&str]) -> SkillsMatrix {
        SkillsMatrix {
            required: required.iter().map(|s| SkillRequirement::new(*s)).collect(),
            nice_to_have: nice.iter().map(|s| SkillRequirement::new(*s)).collect(),
        }
    }

    #[test]
    fn matrix_accepts_distinct_skills() {
        assert!(matrix(&["Go", "Rust"], &["SQL"]).validate().is_ok());
    }

    #[test]
    fn matrix_rejects_duplicate_across_lists() {
        let err = matrix(&["Go"], &["go "]).validate().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("more than once"));
    }

    #[test]
    fn matrix_rejects_blank_skill() {
        assert!(matrix(&["  "], &[]).validate().is_err());
    }

    #[test]
    fn matrix_rejects_weight_out_of_range() {
        let mut m = matrix(&["Go"], &[]);
        m.required[0].weight = 11;
        assert!(m.validate().is_err());
        m.required[0].weight = 0;
        assert!(m.validate().is_err());
    }

    #[test]
    fn matrix_weight_defaults_when_missing() {
        let m: SkillsMatrix =
            serde_json::from_str(r#"{"required":[{"skill":"Go"}]}"#).unwrap();
        assert_eq!(m.required[0].weight, DEFAULT_SKILL_WEIGHT);
        assert!(m.nice_to_have.is_empty());
    }

    #[test]
    fn salary_range_validation() {
        let ok = SalaryRange { min: 100, max: 200, currency: "USD".into() };
        assert!(ok.validate().is_ok());

        let inverted = SalaryRange { min: 300, max: 200, currency: "USD".into() };
        assert!(inverted.validate().is_err());

        let bad_currency = SalaryRange { min: 1, max: 2, currency: "usd".into() };
        assert!(bad_currency.validate().is_err());

        let negative = SalaryRange { min: -1, max: 2, currency: "EUR".into() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn title_validation() {
        assert!(validate_title("Backend Engineer").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn draft_can_be_activated() {
        assert!(can_transition(JobStatus::Draft, JobStatus::Active));
    }

    #[test]
    fn filled_is_terminal() {
        for to in JobStatus::ALL {
            assert!(!can_transition(JobStatus::Filled, *to));
        }
    }

    #[test]
    fn draft_cannot_be_filled() {
        assert_matches!(
            validate_transition(JobStatus::Draft, JobStatus::Filled),
            Err(CoreError::Conflict(_))
        );
    }
}
