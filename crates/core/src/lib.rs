//! Domain types and pure business rules for the talentdesk recruiting service.
//!
//! This crate has no I/O and no internal dependencies so it can be used by
//! the repository layer, the HTTP layer, and their tests alike.

pub mod assessment;
pub mod campaign;
pub mod email;
pub mod error;
pub mod job;
pub mod metrics;
pub mod offer;
pub mod outreach;
pub mod phone_interview;
pub mod roles;
pub mod sequence;
pub mod skills;
pub mod sourcing;
pub mod status;
pub mod template;
pub mod types;
