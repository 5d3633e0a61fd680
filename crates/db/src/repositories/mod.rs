//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod assessment_repo;
pub mod campaign_repo;
pub mod email_log_repo;
pub mod job_repo;
pub mod offer_repo;
pub mod outreach_message_repo;
pub mod phone_interview_repo;
pub mod session_repo;
pub mod sourced_candidate_repo;
pub mod user_repo;

pub use assessment_repo::AssessmentRepo;
pub use campaign_repo::CampaignRepo;
pub use email_log_repo::EmailLogRepo;
pub use job_repo::JobRepo;
pub use offer_repo::OfferRepo;
pub use outreach_message_repo::OutreachMessageRepo;
pub use phone_interview_repo::PhoneInterviewRepo;
pub use session_repo::SessionRepo;
pub use sourced_candidate_repo::SourcedCandidateRepo;
pub use user_repo::UserRepo;
