//! Dashboard roles and the capabilities each one carries.
//!
//! Stored in `users.role` (guarded by a `CHECK` constraint) and embedded in
//! access token claims, so a request's permissions are known without a
//! database round-trip.

use crate::offer::{OfferAction, OfferStatus};
use crate::status::define_text_enum;

define_text_enum! {
    /// What a dashboard operator is allowed to do.
    Role("role") {
        /// Hiring manager: approves offers, plus everything a recruiter does.
        Admin = "admin",
        /// Runs sourcing, campaigns, interviews and candidate conversations.
        Recruiter = "recruiter",
        /// Read-only access.
        Viewer = "viewer",
    }
}

impl Role {
    /// Create and modify records.
    pub fn can_write(self) -> bool {
        matches!(self, Role::Admin | Role::Recruiter)
    }

    /// Decide offers that are waiting for approval.
    pub fn can_approve_offers(self) -> bool {
        self == Role::Admin
    }

    /// Whether this role may apply `action` to an offer in `status`.
    ///
    /// Approving, and anything done to an offer pending approval, is the
    /// approver's call. The rest of the lifecycle is recruiter work.
    pub fn may_apply_offer_action(self, status: OfferStatus, action: OfferAction) -> bool {
        if action == OfferAction::Approve || status == OfferStatus::PendingApproval {
            self.can_approve_offers()
        } else {
            self.can_write()
        }
    }
}
