//! Repository tests against a real Postgres.
//!
//! Ignored by default; run with `DATABASE_URL=... cargo test -- --ignored`.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use talentdesk_core::job::{SkillRequirement, SkillsMatrix};
use talentdesk_core::offer::NegotiationNote;
use talentdesk_core::outreach::MessageStatus;
use talentdesk_core::sequence::{Channel, SequenceStep};
use talentdesk_db::models::campaign::CreateCampaign;
use talentdesk_db::models::job::CreateJob;
use talentdesk_db::models::offer::{CreateOffer, UpdateOffer};
use talentdesk_db::models::outreach_message::NewOutreachMessage;
use talentdesk_db::models::sourced_candidate::{CandidateSearch, NewSourcedCandidate};
use talentdesk_db::repositories::{
    CampaignRepo, JobRepo, OfferRepo, OutreachMessageRepo, SourcedCandidateRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn candidate(job_id: Option<i64>, first: &str, email: &str, skills: &[&str]) -> NewSourcedCandidate {
    NewSourcedCandidate {
        job_id,
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        email: Some(email.to_string()),
        headline: None,
        current_company: None,
        location: Some("Berlin".to_string()),
        profile_url: None,
        source: Some("import".to_string()),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience_years: None,
        fit_score: None,
        notes: None,
    }
}

fn step(body: &str) -> SequenceStep {
    SequenceStep {
        step_number: 1,
        channel: Channel::Email,
        subject_line: Some("Hello".to_string()),
        message_body: body.to_string(),
        delay_days: 0,
        delay_hours: 0,
        send_after_hour: 0,
        send_before_hour: 24,
        send_on_days: Vec::new(),
    }
}

async fn new_job(pool: &PgPool, title: &str) -> i64 {
    let input = CreateJob {
        title: title.to_string(),
        department: None,
        location: None,
        job_type: None,
        remote_policy: None,
        description: None,
        skills_matrix: Default::default(),
        salary_range: None,
    };
    JobRepo::create(pool, &input, None).await.unwrap().id
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn job_defaults_and_single_approval(pool: PgPool) {
    let id = new_job(&pool, "  Backend Engineer ").await;
    let job = JobRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(job.title, "Backend Engineer");
    assert_eq!(job.status, "draft");
    assert_eq!(job.job_type, "full_time");

    // No skills, so nobody is sourced.
    let (approved, sourced) = JobRepo::approve_with_sourcing(&pool, id, 50).await.unwrap().unwrap();
    assert_eq!(approved.status, "active");
    assert!(approved.approved_at.is_some());
    assert!(sourced.is_empty());

    // A second approval finds no draft.
    assert!(JobRepo::approve_with_sourcing(&pool, id, 50).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn job_list_filters_by_status(pool: PgPool) {
    let a = new_job(&pool, "A").await;
    new_job(&pool, "B").await;
    JobRepo::update_status(&pool, a, "paused").await.unwrap();

    let paused = JobRepo::list(&pool, Some("paused")).await.unwrap();
    assert_eq!(paused.len(), 1);
    assert_eq!(paused[0].id, a);
    assert_eq!(JobRepo::list(&pool, None).await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Sourcing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reimport_updates_instead_of_duplicating(pool: PgPool) {
    let job = new_job(&pool, "Data Engineer").await;

    let first = SourcedCandidateRepo::upsert(&pool, &candidate(Some(job), "Ada", "ada@example.com", &["SQL"]))
        .await
        .unwrap();
    assert!(first.inserted);

    let mut again = candidate(Some(job), "Ada", "ADA@example.com", &[]);
    again.headline = Some("Staff engineer".to_string());
    let second = SourcedCandidateRepo::upsert(&pool, &again).await.unwrap();
    assert!(!second.inserted);
    assert_eq!(second.candidate.id, first.candidate.id);
    assert_eq!(second.candidate.headline.as_deref(), Some("Staff engineer"));
    // Empty skills on re-import keep the stored ones.
    assert_eq!(second.candidate.skills, vec!["SQL".to_string()]);

    // Same email without a job is a different candidate.
    let unassigned = SourcedCandidateRepo::upsert(&pool, &candidate(None, "Ada", "ada@example.com", &[]))
        .await
        .unwrap();
    assert!(unassigned.inserted);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn search_matches_any_skill_case_insensitively(pool: PgPool) {
    SourcedCandidateRepo::upsert(&pool, &candidate(None, "Go", "go@example.com", &["Go", "SQL"]))
        .await
        .unwrap();
    SourcedCandidateRepo::upsert(&pool, &candidate(None, "Py", "py@example.com", &["Python"]))
        .await
        .unwrap();

    let filter = CandidateSearch {
        skills: vec!["sql".to_string()],
        ..Default::default()
    };
    let found = SourcedCandidateRepo::search(&pool, &filter, 25).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].first_name, "Go");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ranked_search_keeps_low_scored_skill_match(pool: PgPool) {
    for i in 0..30 {
        let mut filler = candidate(None, "Filler", &format!("f{i}@example.com"), &["COBOL"]);
        filler.fit_score = Some(99);
        SourcedCandidateRepo::upsert(&pool, &filler).await.unwrap();
    }
    let mut rustacean = candidate(None, "Ferris", "ferris@example.com", &[" Rust "]);
    rustacean.fit_score = Some(1);
    SourcedCandidateRepo::upsert(&pool, &rustacean).await.unwrap();

    let filter = CandidateSearch {
        rank_skills: vec!["rust".to_string()],
        rank_weights: vec![5],
        ..Default::default()
    };
    let found = SourcedCandidateRepo::search(&pool, &filter, 5).await.unwrap();
    assert_eq!(found.len(), 5);
    assert_eq!(found[0].first_name, "Ferris");

    // Without ranking skills the stored score decides.
    let unranked = SourcedCandidateRepo::search(&pool, &CandidateSearch::default(), 5)
        .await
        .unwrap();
    assert!(unranked.iter().all(|c| c.first_name == "Filler"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn attach_skips_duplicate_email_on_job(pool: PgPool) {
    let job = new_job(&pool, "SRE").await;
    SourcedCandidateRepo::upsert(&pool, &candidate(Some(job), "Kay", "kay@example.com", &["Go"]))
        .await
        .unwrap();
    let loose = SourcedCandidateRepo::upsert(&pool, &candidate(None, "Kay", "kay@example.com", &["Go"]))
        .await
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let attached = SourcedCandidateRepo::attach_to_job(&mut tx, loose.candidate.id, job, 80)
        .await
        .unwrap();
    assert!(attached.is_none());
    tx.commit().await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn approval_attaches_matching_unassigned_candidates(pool: PgPool) {
    let input = CreateJob {
        title: "Platform Engineer".to_string(),
        department: None,
        location: None,
        job_type: None,
        remote_policy: None,
        description: None,
        skills_matrix: SkillsMatrix {
            required: vec![SkillRequirement::new("Terraform")],
            nice_to_have: Vec::new(),
        },
        salary_range: None,
    };
    let job = JobRepo::create(&pool, &input, None).await.unwrap().id;

    let hit = SourcedCandidateRepo::upsert(&pool, &candidate(None, "Ana", "ana@example.com", &[" terraform "]))
        .await
        .unwrap();
    SourcedCandidateRepo::upsert(&pool, &candidate(None, "Bo", "bo@example.com", &["Knitting"]))
        .await
        .unwrap();

    let (approved, sourced) = JobRepo::approve_with_sourcing(&pool, job, 50)
        .await
        .unwrap()
        .expect("draft job should approve");
    assert_eq!(approved.status, "active");
    assert_eq!(sourced.len(), 1);
    assert_eq!(sourced[0].id, hit.candidate.id);
    assert_eq!(sourced[0].job_id, Some(job));
    assert_eq!(sourced[0].fit_score, Some(100));

    // Already active: nothing changes and nobody else is pulled in.
    assert!(JobRepo::approve_with_sourcing(&pool, job, 50).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Campaigns and messages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn counters_are_recomputed_from_messages(pool: PgPool) {
    let campaign = CampaignRepo::create(
        &pool,
        &CreateCampaign {
            name: "Spring hiring".to_string(),
            job_id: None,
            description: None,
            sequence: vec![step("Hi {{first_name}}")],
        },
        None,
    )
    .await
    .unwrap();
    let who = SourcedCandidateRepo::upsert(&pool, &candidate(None, "Lin", "lin@example.com", &[]))
        .await
        .unwrap()
        .candidate;

    let new_message = NewOutreachMessage {
        campaign_id: campaign.id,
        sourced_candidate_id: who.id,
        step_number: 1,
        channel: "email".to_string(),
        recipient: who.email.clone(),
        subject: Some("Hello".to_string()),
        body: "Hi Lin".to_string(),
        scheduled_for: Utc::now() - Duration::minutes(1),
    };
    let message = OutreachMessageRepo::insert_pending(&pool, &new_message)
        .await
        .unwrap()
        .unwrap();
    // Same recipient and step is skipped.
    assert!(OutreachMessageRepo::insert_pending(&pool, &new_message)
        .await
        .unwrap()
        .is_none());

    let due = OutreachMessageRepo::claim_due(&pool, campaign.id, Utc::now(), 50)
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].status, "sending");
    // A claimed message is not handed out again.
    assert!(OutreachMessageRepo::claim_due(&pool, campaign.id, Utc::now(), 50)
        .await
        .unwrap()
        .is_empty());

    assert!(OutreachMessageRepo::mark_sent(&pool, message.id, "ext-1").await.unwrap().is_some());
    // Outcomes only land on claimed messages.
    assert!(OutreachMessageRepo::mark_failed(&pool, message.id, "late").await.unwrap().is_none());
    let opened = OutreachMessageRepo::apply_event(&pool, message.id, MessageStatus::Opened, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(opened.status, "opened");
    assert!(opened.opened_at.is_some());

    let refreshed = CampaignRepo::refresh_counters(&pool, campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.total_recipients, 1);
    assert_eq!(refreshed.messages_sent, 1);
    assert_eq!(refreshed.messages_opened, 1);
    assert_eq!(refreshed.messages_replied, 0);
}

async fn campaign_with_pending(pool: &PgPool, recipients: usize) -> i64 {
    let campaign = CampaignRepo::create(
        pool,
        &CreateCampaign {
            name: "Claims".to_string(),
            job_id: None,
            description: None,
            sequence: vec![step("Hi {{first_name}}")],
        },
        None,
    )
    .await
    .unwrap();
    for i in 0..recipients {
        let email = format!("r{i}@example.com");
        let who = SourcedCandidateRepo::upsert(pool, &candidate(None, "R", &email, &[]))
            .await
            .unwrap()
            .candidate;
        let message = NewOutreachMessage {
            campaign_id: campaign.id,
            sourced_candidate_id: who.id,
            step_number: 1,
            channel: "email".to_string(),
            recipient: Some(email),
            subject: Some("Hello".to_string()),
            body: "Hi".to_string(),
            scheduled_for: Utc::now() - Duration::minutes(1),
        };
        OutreachMessageRepo::insert_pending(pool, &message).await.unwrap();
    }
    campaign.id
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_claims_are_disjoint(pool: PgPool) {
    let campaign_id = campaign_with_pending(&pool, 3).await;

    let (a, b) = tokio::join!(
        OutreachMessageRepo::claim_due(&pool, campaign_id, Utc::now(), 3),
        OutreachMessageRepo::claim_due(&pool, campaign_id, Utc::now(), 3),
    );
    let mut ids: Vec<i64> = a.unwrap().into_iter().chain(b.unwrap()).map(|m| m.id).collect();
    ids.sort_unstable();
    let before = ids.len();
    ids.dedup();

    assert_eq!(before, 3);
    assert_eq!(ids.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_claims_fail_instead_of_resending(pool: PgPool) {
    let campaign_id = campaign_with_pending(&pool, 2).await;
    let claimed = OutreachMessageRepo::claim_due(&pool, campaign_id, Utc::now(), 1)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);

    // Nothing is old enough yet.
    let none = OutreachMessageRepo::fail_stale_claims(&pool, campaign_id, Utc::now() - Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(none, 0);

    let failed = OutreachMessageRepo::fail_stale_claims(&pool, campaign_id, Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(failed, 1);

    let messages = OutreachMessageRepo::list_for_campaign(&pool, campaign_id).await.unwrap();
    let mut statuses: Vec<&str> = messages.iter().map(|m| m.status.as_str()).collect();
    statuses.sort_unstable();
    assert_eq!(statuses, vec!["failed", "pending"]);
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn offer_response_appends_to_log(pool: PgPool) {
    let offer = OfferRepo::create(
        &pool,
        &CreateOffer {
            job_id: None,
            candidate_name: "Sam Rivera".to_string(),
            candidate_email: "sam@example.com".to_string(),
            position_title: "Designer".to_string(),
            base_salary: 90_000,
            currency: None,
            bonus: None,
            equity: None,
            signing_bonus: None,
            benefits: vec!["Health".to_string()],
            start_date: None,
            expires_at: None,
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(offer.currency, "USD");
    assert_eq!(offer.status, "draft");

    let asked = NegotiationNote::new("Asked for 95k", "candidate", Utc::now()).unwrap();
    let countered = OfferRepo::record_response(&pool, offer.id, "negotiating", Some(&asked))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(countered.negotiation_notes.0.len(), 1);
    assert!(countered.responded_at.is_some());

    // Concurrent appends both land.
    let a = NegotiationNote::new("Offered 92k", "recruiter:1", Utc::now()).unwrap();
    let b = NegotiationNote::new("Added remote stipend", "recruiter:2", Utc::now()).unwrap();
    let (ra, rb) = tokio::join!(
        OfferRepo::set_status(&pool, offer.id, "negotiating", Some(&a)),
        OfferRepo::set_status(&pool, offer.id, "negotiating", Some(&b)),
    );
    ra.unwrap();
    rb.unwrap();
    let after = OfferRepo::find_by_id(&pool, offer.id).await.unwrap().unwrap();
    let notes: Vec<&str> = after.negotiation_notes.0.iter().map(|n| n.note.as_str()).collect();
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0], "Asked for 95k");
    assert!(notes.contains(&"Offered 92k") && notes.contains(&"Added remote stipend"));

    // A status change without a note leaves the log alone.
    let sent = OfferRepo::set_status(&pool, offer.id, "sent", None).await.unwrap().unwrap();
    assert_eq!(sent.negotiation_notes.0.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn offer_update_clears_bonus_and_trims_names(pool: PgPool) {
    let offer = OfferRepo::create(
        &pool,
        &CreateOffer {
            job_id: None,
            candidate_name: "Sam Rivera".to_string(),
            candidate_email: "sam@example.com".to_string(),
            position_title: "Designer".to_string(),
            base_salary: 90_000,
            currency: None,
            bonus: Some(5_000),
            equity: Some("0.1%".to_string()),
            signing_bonus: None,
            benefits: vec![],
            start_date: None,
            expires_at: None,
        },
        None,
    )
    .await
    .unwrap();

    let update: UpdateOffer =
        serde_json::from_str(r#"{"bonus": null, "candidate_name": "  Sam R.  "}"#).unwrap();
    let updated = OfferRepo::update(&pool, offer.id, &update).await.unwrap().unwrap();

    assert_eq!(updated.bonus, None);
    assert_eq!(updated.equity.as_deref(), Some("0.1%"));
    assert_eq!(updated.candidate_name, "Sam R.");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn status_check_constraint_rejects_unknown_values(pool: PgPool) {
    let id = new_job(&pool, "QA").await;
    let result = JobRepo::update_status(&pool, id, "archived").await;
    assert_matches!(result, Err(sqlx::Error::Database(_)));
}
