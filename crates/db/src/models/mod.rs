//! Row models and request DTOs, one module per table.
//!
//! Rows derive `FromRow + Serialize`; create/update DTOs derive
//! `Deserialize` and are bound directly by the repositories. Status
//! columns are plain `TEXT` and parsed into the `talentdesk_core` enums
//! where business rules need them.

pub mod assessment;
pub mod campaign;
pub mod email_log;
pub mod job;
pub mod offer;
pub mod outreach_message;
pub mod phone_interview;
pub mod session;
pub mod sourced_candidate;
pub mod user;
