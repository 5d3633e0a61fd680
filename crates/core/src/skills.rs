//! Candidate-to-job skill matching.
//!
//! Matching is a case-insensitive set intersection on trimmed skill names.
//! Nothing here is persisted; callers recompute on every read.

use std::collections::HashSet;

use serde::Serialize;

use crate::job::SkillsMatrix;

/// Result of comparing a candidate's skills with a job's matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatch {
    /// Required skills the candidate has, in matrix order.
    pub matched_required: Vec<String>,
    /// Required skills the candidate lacks, in matrix order.
    pub missing_required: Vec<String>,
    /// Nice-to-have skills the candidate has, in matrix order.
    pub matched_nice_to_have: Vec<String>,
    /// Share of required skills matched, rounded to a whole percent.
    pub required_match_pct: i32,
}

fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

fn skill_set<S: AsRef<str>>(skills: &[S]) -> HashSet<String> {
    skills
        .iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn percent(part: i64, whole: i64) -> i32 {
    if whole <= 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as i32
}

/// Compare `candidate_skills` against `matrix`.
///
/// A job with no required skills yields `required_match_pct == 0`.
pub fn skill_match<S: AsRef<str>>(candidate_skills: &[S], matrix: &SkillsMatrix) -> SkillMatch {
    let have = skill_set(candidate_skills);

    let (matched_required, missing_required): (Vec<_>, Vec<_>) = matrix
        .required
        .iter()
        .map(|r| r.skill.clone())
        .partition(|s| have.contains(&normalize(s)));

    let matched_nice_to_have = matrix
        .nice_to_have
        .iter()
        .map(|r| r.skill.clone())
        .filter(|s| have.contains(&normalize(s)))
        .collect();

    let required_match_pct = percent(
        matched_required.len() as i64,
        matrix.required.len() as i64,
    );

    SkillMatch {
        matched_required,
        missing_required,
        matched_nice_to_have,
        required_match_pct,
    }
}

/// Weighted share (0-100) of every matrix skill the candidate has.
///
/// Required and nice-to-have entries both count by their `weight`. An empty
/// matrix scores 0.
pub fn weighted_fit_score<S: AsRef<str>>(candidate_skills: &[S], matrix: &SkillsMatrix) -> i32 {
    let have = skill_set(candidate_skills);

    let (matched, total) = matrix
        .required
        .iter()
        .chain(matrix.nice_to_have.iter())
        .fold((0i64, 0i64), |(matched, total), req| {
            let weight = i64::from(req.weight.max(0));
            let hit = if have.contains(&normalize(&req.skill)) { weight } else { 0 };
            (matched + hit, total + weight)
        });

    percent(matched, total)
}

/// Normalized skill names and non-negative weights of every matrix entry,
/// as parallel lists.
///
/// Summing the weights of the entries a candidate has gives the numerator
/// of [`weighted_fit_score`], so a store can order rows by it before the
/// exact score is computed.
pub fn ranking_weights(matrix: &SkillsMatrix) -> (Vec<String>, Vec<i32>) {
    matrix
        .required
        .iter()
        .chain(matrix.nice_to_have.iter())
        .map(|req| (normalize(&req.skill), req.weight.max(0)))
        .filter(|(skill, _)| !skill.is_empty())
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SkillRequirement;

    fn matrix(required: &[&str], nice: &[&str]) -> SkillsMatrix {
        SkillsMatrix {
            required: required.iter().map(|s| SkillRequirement::new(*s)).collect(),
            nice_to_have: nice.iter().map(|s| SkillRequirement::new(*s)).collect(),
        }
    }

    #[test]
    fn half_of_required_matched() {
        let m = skill_match(&["Go", "SQL"], &matrix(&["Go", "Rust"], &[]));
        assert_eq!(m.required_match_pct, 50);
        assert_eq!(m.matched_required, vec!["Go"]);
        assert_eq!(m.missing_required, vec!["Rust"]);
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let m = skill_match(&[" postgresql ", "RUST"], &matrix(&["Rust", "PostgreSQL"], &[]));
        assert_eq!(m.required_match_pct, 100);
        assert!(m.missing_required.is_empty());
    }

    #[test]
    fn nice_to_have_does_not_affect_required_pct() {
        let m = skill_match(&["Docker"], &matrix(&["Go"], &["docker"]));
        assert_eq!(m.required_match_pct, 0);
        assert_eq!(m.matched_nice_to_have, vec!["docker"]);
    }

    #[test]
    fn empty_required_list_scores_zero() {
        let m = skill_match(&["Go"], &matrix(&[], &["Go"]));
        assert_eq!(m.required_match_pct, 0);
    }

    #[test]
    fn rounds_to_nearest_percent() {
        let m = skill_match(&["a"], &matrix(&["a", "b", "c"], &[]));
        assert_eq!(m.required_match_pct, 33);
        let m = skill_match(&["a", "b"], &matrix(&["a", "b", "c"], &[]));
        assert_eq!(m.required_match_pct, 67);
    }

    #[test]
    fn weighted_score_uses_weights() {
        let mut m = matrix(&["Go", "Rust"], &[]);
        m.required[0].weight = 9;
        m.required[1].weight = 1;
        assert_eq!(weighted_fit_score(&["go"], &m), 90);
        assert_eq!(weighted_fit_score(&["rust"], &m), 10);
    }

    #[test]
    fn weighted_score_of_empty_matrix_is_zero() {
        assert_eq!(weighted_fit_score(&["Go"], &SkillsMatrix::default()), 0);
    }

    #[test]
    fn weighted_score_counts_nice_to_have() {
        let m = matrix(&["Go"], &["SQL"]);
        assert_eq!(weighted_fit_score(&["SQL"], &m), 50);
        assert_eq!(weighted_fit_score(&["SQL", "Go"], &m), 100);
    }

    #[test]
    fn ranking_weights_follow_the_fit_score() {
        let mut m = matrix(&[" Rust ", "SQL"], &["Go"]);
        m.required[0].weight = 3;
        m.required[1].weight = 1;
        m.nice_to_have[0].weight = -2;

        let (skills, weights) = ranking_weights(&m);
        assert_eq!(skills, vec!["rust", "sql", "go"]);
        assert_eq!(weights, vec![3, 1, 0]);

        // Rust alone carries 3 of the 4 weight points.
        assert_eq!(weighted_fit_score(&["rust"], &m), 75);
    }
}
