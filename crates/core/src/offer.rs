//! Offer lifecycle: status enum, action gating, negotiation log and the
//! outbound offer email.
//!
//! The dashboard renders one button per entry of [`available_actions`] and
//! the server re-checks the same table in [`apply_action`], so a stale page
//! cannot push an offer through an illegal transition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::define_text_enum;
use crate::template::{render, Personalization};
use crate::types::Timestamp;

/// Maximum length of one negotiation note.
pub const MAX_NOTE_LENGTH: usize = 5_000;

define_text_enum! {
    /// Offer lifecycle status.
    OfferStatus("offer status") {
        Draft = "draft",
        PendingApproval = "pending_approval",
        Approved = "approved",
        Sent = "sent",
        Viewed = "viewed",
        Negotiating = "negotiating",
        Accepted = "accepted",
        Rejected = "rejected",
        Expired = "expired",
        Withdrawn = "withdrawn",
    }
}

define_text_enum! {
    /// A user-triggered offer action.
    OfferAction("offer action") {
        SubmitForApproval = "submit_for_approval",
        Approve = "approve",
        Send = "send",
        Accept = "accept",
        Counter = "counter",
        Reject = "reject",
        Withdraw = "withdraw",
    }
}

impl OfferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OfferStatus::Accepted | OfferStatus::Rejected | OfferStatus::Expired | OfferStatus::Withdrawn
        )
    }

    /// Compensation may only change before sending or while negotiating.
    pub fn terms_editable(self) -> bool {
        matches!(
            self,
            OfferStatus::Draft | OfferStatus::PendingApproval | OfferStatus::Negotiating
        )
    }
}

/// Actions exposed for an offer in `status`.
pub fn available_actions(status: OfferStatus) -> &'static [OfferAction] {
    use OfferAction::*;
    match status {
        OfferStatus::Draft => &[Approve],
        OfferStatus::PendingApproval => &[Approve, Reject],
        OfferStatus::Approved => &[Send, Withdraw],
        OfferStatus::Sent | OfferStatus::Viewed | OfferStatus::Negotiating => {
            &[Accept, Counter, Reject, Withdraw]
        }
        OfferStatus::Accepted
        | OfferStatus::Rejected
        | OfferStatus::Expired
        | OfferStatus::Withdrawn => &[],
    }
}

/// Status an offer moves to when `action` is applied in `status`.
///
/// `SubmitForApproval` is only valid from draft and is not rendered as a
/// button; it is how a recruiter routes an offer to an approver instead of
/// approving it directly.
pub fn apply_action(status: OfferStatus, action: OfferAction) -> Result<OfferStatus, CoreError> {
    if action == OfferAction::SubmitForApproval {
        return if status == OfferStatus::Draft {
            Ok(OfferStatus::PendingApproval)
        } else {
            Err(not_available(status, action))
        };
    }

    if !available_actions(status).contains(&action) {
        return Err(not_available(status, action));
    }

    let next = match action {
        OfferAction::Approve => OfferStatus::Approved,
        OfferAction::Send => OfferStatus::Sent,
        OfferAction::Accept => OfferStatus::Accepted,
        OfferAction::Counter => OfferStatus::Negotiating,
        OfferAction::Reject => OfferStatus::Rejected,
        OfferAction::Withdraw => OfferStatus::Withdrawn,
        OfferAction::SubmitForApproval => OfferStatus::PendingApproval,
    };
    Ok(next)
}

fn not_available(status: OfferStatus, action: OfferAction) -> CoreError {
    CoreError::Conflict(format!(
        "Action '{action}' is not available for an offer in status '{status}'"
    ))
}

/// Status after the candidate opens the offer. Only `sent` changes.
pub fn mark_viewed(status: OfferStatus) -> OfferStatus {
    if status == OfferStatus::Sent {
        OfferStatus::Viewed
    } else {
        status
    }
}

/// Whether an outstanding offer has passed its `expires_at`.
///
/// Only offers waiting on the candidate expire; drafts and approved offers
/// keep their date until they are sent.
pub fn should_expire(status: OfferStatus, expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    let awaiting_candidate = matches!(
        status,
        OfferStatus::Sent | OfferStatus::Viewed | OfferStatus::Negotiating
    );
    awaiting_candidate && expires_at.is_some_and(|at| at <= now)
}

// ---------------------------------------------------------------------------
// Negotiation log
// ---------------------------------------------------------------------------

/// One entry of `offers.negotiation_notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationNote {
    pub timestamp: Timestamp,
    pub note: String,
    pub actor: String,
}

impl NegotiationNote {
    /// A trimmed, length-checked note. The log is append-only: stores add
    /// entries and never rewrite existing ones.
    pub fn new(note: &str, actor: &str, at: Timestamp) -> Result<Self, CoreError> {
        let trimmed = note.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(
                "Negotiation note must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_NOTE_LENGTH {
            return Err(CoreError::Validation(format!(
                "Negotiation note exceeds maximum length of {MAX_NOTE_LENGTH} characters"
            )));
        }
        Ok(Self {
            timestamp: at,
            note: trimmed.to_string(),
            actor: actor.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Compensation
// ---------------------------------------------------------------------------

/// Validate offer amounts. Base salary is required and positive; the
/// optional components may be zero.
pub fn validate_compensation(
    base_salary: i64,
    bonus: Option<i64>,
    signing_bonus: Option<i64>,
) -> Result<(), CoreError> {
    if base_salary <= 0 {
        return Err(CoreError::Validation(
            "Base salary must be greater than zero".to_string(),
        ));
    }
    for (name, value) in [("bonus", bonus), ("signing_bonus", signing_bonus)] {
        if value.is_some_and(|v| v < 0) {
            return Err(CoreError::Validation(format!("{name} must not be negative")));
        }
    }
    Ok(())
}

/// Currencies are three-letter uppercase ISO codes.
pub fn validate_currency(code: &str) -> Result<(), CoreError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid currency '{code}'. Expected a three-letter ISO code"
        )))
    }
}

// ---------------------------------------------------------------------------
// Offer email
// ---------------------------------------------------------------------------

/// The email a candidate receives when an offer is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailPreview {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Inputs for [`render_offer_email`].
#[derive(Debug, Clone)]
pub struct OfferLetter<'a> {
    pub candidate_name: &'a str,
    pub candidate_email: &'a str,
    pub position_title: &'a str,
    pub company: &'a str,
    pub sender_name: &'a str,
    pub base_salary: i64,
    pub currency: &'a str,
    pub bonus: Option<i64>,
    pub signing_bonus: Option<i64>,
    pub equity: Option<&'a str>,
    pub benefits: &'a [String],
    pub start_date: Option<NaiveDate>,
    pub expires_at: Option<Timestamp>,
}

const OFFER_SUBJECT: &str = "Your offer for {{job_title}} at {{company}}";

const OFFER_OPENING: &str = "Dear {{first_name}},\n\n\
We are delighted to offer you the position of {{job_title}} at {{company}}.";

const OFFER_CLOSING: &str = "Best regards,\n{{sender_name}}";

fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if amount < 0 {
        out.insert(0, '-');
    }
    out
}

/// Build the offer email from the offer's terms.
pub fn render_offer_email(letter: &OfferLetter<'_>) -> EmailPreview {
    let (first_name, last_name) = crate::sourcing::split_name(letter.candidate_name);
    let values = Personalization {
        first_name,
        last_name,
        company: letter.company.to_string(),
        job_title: letter.position_title.to_string(),
        sender_name: letter.sender_name.to_string(),
    };

    let mut terms = vec![format!(
        "- Base salary: {} {}",
        format_amount(letter.base_salary),
        letter.currency
    )];
    if let Some(bonus) = letter.bonus.filter(|b| *b > 0) {
        terms.push(format!("- Annual bonus: {} {}", format_amount(bonus), letter.currency));
    }
    if let Some(signing) = letter.signing_bonus.filter(|b| *b > 0) {
        terms.push(format!("- Signing bonus: {} {}", format_amount(signing), letter.currency));
    }
    if let Some(equity) = letter.equity.filter(|e| !e.trim().is_empty()) {
        terms.push(format!("- Equity: {equity}"));
    }
    if !letter.benefits.is_empty() {
        terms.push(format!("- Benefits: {}", letter.benefits.join(", ")));
    }
    if let Some(start) = letter.start_date {
        terms.push(format!("- Start date: {}", start.format("%B %-d, %Y")));
    }

    let mut body = render(OFFER_OPENING, &values);
    body.push_str("\n\n");
    body.push_str(&terms.join("\n"));
    if let Some(expires) = letter.expires_at {
        body.push_str(&format!(
            "\n\nThis offer is valid until {}.",
            expires.format("%B %-d, %Y")
        ));
    }
    body.push_str("\n\n");
    body.push_str(&render(OFFER_CLOSING, &values));

    EmailPreview {
        to: letter.candidate_email.to_string(),
        subject: render(OFFER_SUBJECT, &values),
        body,
    }
}
