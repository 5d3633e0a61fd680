//! `{{placeholder}}` substitution for outreach and offer messages.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Placeholders understood by [`render`].
pub const KNOWN_PLACEHOLDERS: &[&str] = &[
    "first_name",
    "last_name",
    "full_name",
    "company",
    "job_title",
    "sender_name",
];

/// Values substituted into a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Personalization {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub job_title: String,
    pub sender_name: String,
}

impl Personalization {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "first_name" => Some(self.first_name.clone()),
            "last_name" => Some(self.last_name.clone()),
            "full_name" => Some(
                format!("{} {}", self.first_name, self.last_name)
                    .trim()
                    .to_string(),
            ),
            "company" => Some(self.company.clone()),
            "job_title" => Some(self.job_title.clone()),
            "sender_name" => Some(self.sender_name.clone()),
            _ => None,
        }
    }
}

/// `{{name}}`, with optional whitespace inside the braces.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Substitute known placeholders. Unknown ones are left verbatim.
pub fn render(template: &str, values: &Personalization) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .lookup(&caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Placeholders in `template` that [`render`] would not substitute.
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let key = &caps[1];
        if !KNOWN_PLACEHOLDERS.contains(&key) && !found.iter().any(|f| f == key) {
            found.push(key.to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Personalization {
        Personalization {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            company: "Analytical Engines".into(),
            job_title: "Staff Engineer".into(),
            sender_name: "Grace".into(),
        }
    }

    #[test]
    fn substitutes_known_placeholders() {
        let out = render("Hi {{first_name}}, the {{ job_title }} role at {{company}}", &ada());
        assert_eq!(out, "Hi Ada, the Staff Engineer role at Analytical Engines");
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(render("{{full_name}}", &ada()), "Ada Lovelace");
        let mut p = ada();
        p.last_name.clear();
        assert_eq!(render("{{full_name}}", &p), "Ada");
    }

    #[test]
    fn unknown_placeholder_left_verbatim() {
        assert_eq!(render("Hi {{nickname}}!", &ada()), "Hi {{nickname}}!");
    }

    #[test]
    fn unterminated_braces_copied_through() {
        assert_eq!(render("Hi {{first_name", &ada()), "Hi {{first_name");
    }

    #[test]
    fn lists_unknown_placeholders_once() {
        let unknown = unknown_placeholders("{{frist_name}} {{company}} {{ frist_name }} {{x}}");
        assert_eq!(unknown, vec!["frist_name".to_string(), "x".to_string()]);
    }

    #[test]
    fn no_placeholders_is_identity() {
        assert_eq!(render("plain text", &ada()), "plain text");
        assert!(unknown_placeholders("plain text").is_empty());
    }
}
