//! Candidate assessment kinds, statuses and scoring.

use crate::error::CoreError;
use crate::status::define_text_enum;

define_text_enum! {
    /// How the assessment is conducted.
    AssessmentKind("assessment kind") {
        Video = "video",
        Questionnaire = "questionnaire",
    }
}

define_text_enum! {
    /// Assessment progress.
    AssessmentStatus("assessment status") {
        Pending = "pending",
        InProgress = "in_progress",
        Completed = "completed",
        Reviewed = "reviewed",
    }
}

define_text_enum! {
    /// Reviewer's hiring recommendation.
    Recommendation("recommendation") {
        StrongHire = "strong_hire",
        Hire = "hire",
        Maybe = "maybe",
        NoHire = "no_hire",
        StrongNoHire = "strong_no_hire",
    }
}

/// Statuses reachable from `from`.
pub fn valid_transitions(from: AssessmentStatus) -> &'static [AssessmentStatus] {
    use AssessmentStatus::*;
    match from {
        Pending => &[InProgress, Completed],
        InProgress => &[Completed],
        Completed => &[Reviewed],
        Reviewed => &[],
    }
}

pub fn validate_transition(from: AssessmentStatus, to: AssessmentStatus) -> Result<(), CoreError> {
    if valid_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Assessment cannot move from {from} to {to}"
        )))
    }
}

/// Scores are percentages.
pub fn validate_score(score: i32) -> Result<(), CoreError> {
    if (0..=100).contains(&score) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Score {score} is out of range (0-100)"
        )))
    }
}

/// Default recommendation for a score, used when the reviewer leaves it blank.
pub fn recommendation_for_score(score: i32) -> Recommendation {
    match score {
        s if s >= 90 => Recommendation::StrongHire,
        s if s >= 75 => Recommendation::Hire,
        s if s >= 60 => Recommendation::Maybe,
        s if s >= 40 => Recommendation::NoHire,
        _ => Recommendation::StrongNoHire,
    }
}
