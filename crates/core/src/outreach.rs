//! Per-recipient outreach message status.

use crate::status::define_text_enum;

define_text_enum! {
    /// Delivery and engagement state of one outreach message.
    MessageStatus("message status") {
        Pending = "pending",
        /// Claimed by a send batch; dispatch is in flight.
        Sending = "sending",
        Sent = "sent",
        Delivered = "delivered",
        Opened = "opened",
        Clicked = "clicked",
        Replied = "replied",
        Bounced = "bounced",
        Failed = "failed",
    }
}

impl MessageStatus {
    /// Bounced and failed messages receive no further updates.
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, MessageStatus::Bounced | MessageStatus::Failed)
    }
}

/// Position on the engagement ladder. Failures rank with `Sent` since they
/// can only follow a send attempt.
pub fn engagement_rank(status: MessageStatus) -> u8 {
    use MessageStatus::*;
    match status {
        Pending | Sending => 0,
        Sent | Bounced | Failed => 1,
        Delivered => 2,
        Opened => 3,
        Clicked => 4,
        Replied => 5,
    }
}

/// Whether a delivery event carrying `incoming` should overwrite `current`.
///
/// Events may arrive out of order, so only forward movement is applied and
/// failed messages are frozen. A bounce or failure is accepted until the
/// message has been delivered.
pub fn should_apply(current: MessageStatus, incoming: MessageStatus) -> bool {
    if current.is_terminal_failure() || current == incoming {
        return false;
    }
    if incoming.is_terminal_failure() {
        return engagement_rank(current) <= engagement_rank(MessageStatus::Sent);
    }
    engagement_rank(incoming) > engagement_rank(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use MessageStatus::*;

    #[test]
    fn forward_events_apply() {
        assert!(should_apply(Sent, Delivered));
        assert!(should_apply(Sent, Opened));
        assert!(should_apply(Opened, Replied));
    }

    #[test]
    fn backward_events_ignored() {
        assert!(!should_apply(Clicked, Opened));
        assert!(!should_apply(Replied, Delivered));
        assert!(!should_apply(Opened, Opened));
    }

    #[test]
    fn failures_are_frozen() {
        assert!(!should_apply(Bounced, Opened));
        assert!(!should_apply(Failed, Sent));
    }

    #[test]
    fn claimed_message_is_still_unsent() {
        assert_eq!(engagement_rank(Sending), engagement_rank(Pending));
        assert!(should_apply(Sending, Sent));
        assert!(should_apply(Sending, Failed));
        assert_eq!("sending".parse::<MessageStatus>().unwrap(), Sending);
    }

    #[test]
    fn bounce_only_before_delivery() {
        assert!(should_apply(Sent, Bounced));
        assert!(should_apply(Pending, Failed));
        assert!(!should_apply(Delivered, Bounced));
        assert!(!should_apply(Opened, Bounced));
    }
}
