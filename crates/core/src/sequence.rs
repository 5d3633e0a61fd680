//! Outreach sequence steps: editing, validation and send-window scheduling.
//!
//! A campaign's sequence is an ordered list of [`SequenceStep`]s persisted as
//! JSON. Step numbers are positional: every edit renumbers the list 1..N.

use chrono::{Datelike, Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::define_text_enum;
use crate::template::unknown_placeholders;
use crate::types::Timestamp;

/// Maximum number of steps in one sequence.
pub const MAX_STEPS: usize = 10;

/// Default send window (inclusive start hour, exclusive end hour, UTC).
pub const DEFAULT_SEND_AFTER_HOUR: i32 = 9;
pub const DEFAULT_SEND_BEFORE_HOUR: i32 = 17;

define_text_enum! {
    /// Delivery channel of a step.
    Channel("channel") {
        Email = "email",
        Linkedin = "linkedin",
        Sms = "sms",
    }
}

define_text_enum! {
    /// Day of the week a step may be sent on.
    Weekday("weekday") {
        Monday = "monday",
        Tuesday = "tuesday",
        Wednesday = "wednesday",
        Thursday = "thursday",
        Friday = "friday",
        Saturday = "saturday",
        Sunday = "sunday",
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

fn default_send_after_hour() -> i32 {
    DEFAULT_SEND_AFTER_HOUR
}

fn default_send_before_hour() -> i32 {
    DEFAULT_SEND_BEFORE_HOUR
}

fn default_send_on_days() -> Vec<Weekday> {
    vec![
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ]
}

/// One templated message plus its delay and send-window rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceStep {
    /// Assigned by the server; any client value is overwritten on save.
    #[serde(default)]
    pub step_number: i32,
    pub channel: Channel,
    #[serde(default)]
    pub subject_line: Option<String>,
    pub message_body: String,
    #[serde(default)]
    pub delay_days: i32,
    #[serde(default)]
    pub delay_hours: i32,
    #[serde(default = "default_send_after_hour")]
    pub send_after_hour: i32,
    #[serde(default = "default_send_before_hour")]
    pub send_before_hour: i32,
    #[serde(default = "default_send_on_days")]
    pub send_on_days: Vec<Weekday>,
}

impl SequenceStep {
    /// Validate a single step in isolation.
    pub fn validate(&self) -> Result<(), CoreError> {
        let n = self.step_number;
        if self.message_body.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Step {n}: message body must not be empty"
            )));
        }
        if self.channel == Channel::Email
            && self.subject_line.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            return Err(CoreError::Validation(format!(
                "Step {n}: email steps require a subject line"
            )));
        }
        if self.delay_days < 0 || self.delay_hours < 0 {
            return Err(CoreError::Validation(format!(
                "Step {n}: delays must not be negative"
            )));
        }
        if !(0 <= self.send_after_hour
            && self.send_after_hour < self.send_before_hour
            && self.send_before_hour <= 24)
        {
            return Err(CoreError::Validation(format!(
                "Step {n}: send window {}..{} is invalid (expected 0 <= after < before <= 24)",
                self.send_after_hour, self.send_before_hour
            )));
        }
        if self.send_on_days.is_empty() {
            return Err(CoreError::Validation(format!(
                "Step {n}: at least one send day is required"
            )));
        }
        let text = format!(
            "{}\n{}",
            self.subject_line.as_deref().unwrap_or_default(),
            self.message_body
        );
        let unknown = unknown_placeholders(&text);
        if !unknown.is_empty() {
            return Err(CoreError::Validation(format!(
                "Step {n}: unknown placeholder(s): {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }

    fn sends_on(&self, day: chrono::Weekday) -> bool {
        self.send_on_days.contains(&Weekday::from(day))
    }
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// Assign step numbers 1..N in list order.
pub fn renumber(steps: &mut [SequenceStep]) {
    for (i, step) in steps.iter_mut().enumerate() {
        step.step_number = i as i32 + 1;
    }
}

/// Append a step at the end.
pub fn add_step(steps: &mut Vec<SequenceStep>, step: SequenceStep) {
    steps.push(step);
    renumber(steps);
}

/// Insert a step at `index`, clamped to `0..=len`.
pub fn insert_step(steps: &mut Vec<SequenceStep>, index: usize, step: SequenceStep) {
    let index = index.min(steps.len());
    steps.insert(index, step);
    renumber(steps);
}

/// Remove the step with `step_number` and renumber the rest.
pub fn delete_step(
    steps: &mut Vec<SequenceStep>,
    step_number: i32,
) -> Result<SequenceStep, CoreError> {
    let pos = steps
        .iter()
        .position(|s| s.step_number == step_number)
        .ok_or_else(|| {
            CoreError::Validation(format!("Sequence has no step {step_number}"))
        })?;
    let removed = steps.remove(pos);
    renumber(steps);
    Ok(removed)
}

/// Move the step at index `from` to index `to` (both 0-based, clamped).
pub fn move_step(steps: &mut Vec<SequenceStep>, from: usize, to: usize) {
    if steps.is_empty() {
        return;
    }
    let last = steps.len() - 1;
    let from = from.min(last);
    let to = to.min(last);
    let step = steps.remove(from);
    steps.insert(to, step);
    renumber(steps);
}

/// Validate a whole sequence: bounds, positional numbering, every step.
pub fn validate_sequence(steps: &[SequenceStep]) -> Result<(), CoreError> {
    if steps.is_empty() {
        return Err(CoreError::Validation(
            "A sequence needs at least one step".to_string(),
        ));
    }
    if steps.len() > MAX_STEPS {
        return Err(CoreError::Validation(format!(
            "A sequence may have at most {MAX_STEPS} steps"
        )));
    }
    for (i, step) in steps.iter().enumerate() {
        if step.step_number != i as i32 + 1 {
            return Err(CoreError::Validation(format!(
                "Step at position {} is numbered {}",
                i + 1,
                step.step_number
            )));
        }
        step.validate()?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Earliest instant at or after `anchor + delay` that falls inside the
/// step's hour window on one of its send days.
///
/// The window is evaluated in UTC. A step with no send days only applies
/// the delay.
pub fn next_send_time(anchor: Timestamp, step: &SequenceStep) -> Timestamp {
    let earliest = anchor
        + Duration::days(i64::from(step.delay_days.max(0)))
        + Duration::hours(i64::from(step.delay_hours.max(0)));

    if step.send_on_days.is_empty() {
        return earliest;
    }

    let window_start =
        NaiveTime::from_hms_opt(step.send_after_hour.clamp(0, 23) as u32, 0, 0).unwrap_or_default();

    let mut candidate = earliest;
    // Eight days covers every weekday plus the starting one.
    for _ in 0..8 {
        if step.sends_on(candidate.weekday()) {
            let hour = candidate.hour() as i32;
            if hour < step.send_after_hour {
                return candidate.date_naive().and_time(window_start).and_utc();
            }
            if hour < step.send_before_hour {
                return candidate;
            }
        }
        candidate = (candidate.date_naive() + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc();
    }
    earliest
}
