//! Campaign lifecycle and engagement counters.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::define_text_enum;

define_text_enum! {
    /// Lifecycle of an outreach campaign.
    CampaignStatus("campaign status") {
        Draft = "draft",
        Active = "active",
        Paused = "paused",
        Completed = "completed",
    }
}

/// Statuses reachable from `from`. `Completed` is terminal.
pub fn valid_transitions(from: CampaignStatus) -> &'static [CampaignStatus] {
    use CampaignStatus::*;
    match from {
        Draft => &[Active],
        Active => &[Paused, Completed],
        Paused => &[Active, Completed],
        Completed => &[],
    }
}

pub fn can_transition(from: CampaignStatus, to: CampaignStatus) -> bool {
    valid_transitions(from).contains(&to)
}

pub fn validate_transition(from: CampaignStatus, to: CampaignStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Campaign cannot move from {from} to {to}"
        )))
    }
}

/// Whether the sequence may still be edited.
pub fn sequence_editable(status: CampaignStatus) -> bool {
    matches!(status, CampaignStatus::Draft | CampaignStatus::Paused)
}

/// Aggregate counters stored on the campaign row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignCounters {
    pub total_recipients: i64,
    pub messages_sent: i64,
    pub messages_opened: i64,
    pub messages_clicked: i64,
    pub messages_replied: i64,
    pub messages_bounced: i64,
}

/// Engagement rates in percent of messages sent, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CampaignRates {
    pub open_rate: f64,
    pub click_rate: f64,
    pub reply_rate: f64,
    pub bounce_rate: f64,
}

fn rate(part: i64, sent: i64) -> f64 {
    if sent <= 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / sent as f64).round() / 10.0
}

impl CampaignCounters {
    pub fn rates(&self) -> CampaignRates {
        CampaignRates {
            open_rate: rate(self.messages_opened, self.messages_sent),
            click_rate: rate(self.messages_clicked, self.messages_sent),
            reply_rate: rate(self.messages_replied, self.messages_sent),
            bounce_rate: rate(self.messages_bounced, self.messages_sent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_only_activates() {
        assert_eq!(valid_transitions(CampaignStatus::Draft), &[CampaignStatus::Active]);
    }

    #[test]
    fn paused_can_resume_or_complete() {
        assert!(can_transition(CampaignStatus::Paused, CampaignStatus::Active));
        assert!(can_transition(CampaignStatus::Paused, CampaignStatus::Completed));
        assert!(!can_transition(CampaignStatus::Paused, CampaignStatus::Draft));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(validate_transition(CampaignStatus::Completed, CampaignStatus::Active).is_err());
    }

    #[test]
    fn sequence_locked_while_active() {
        assert!(sequence_editable(CampaignStatus::Draft));
        assert!(!sequence_editable(CampaignStatus::Active));
        assert!(!sequence_editable(CampaignStatus::Completed));
    }

    #[test]
    fn rates_are_zero_without_sends() {
        let rates = CampaignCounters::default().rates();
        assert_eq!(rates.open_rate, 0.0);
        assert_eq!(rates.bounce_rate, 0.0);
    }

    #[test]
    fn rates_round_to_one_decimal() {
        let counters = CampaignCounters {
            messages_sent: 3,
            messages_opened: 2,
            messages_replied: 1,
            ..Default::default()
        };
        let rates = counters.rates();
        assert_eq!(rates.open_rate, 66.7);
        assert_eq!(rates.reply_rate, 33.3);
        assert_eq!(rates.click_rate, 0.0);
    }
}
