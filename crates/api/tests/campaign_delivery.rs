//! Campaign recipients, sending and delivery callbacks against a real
//! Postgres, with a counting gateway standing in for the outreach service.
//!
//! Ignored by default; run with `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, create_user, get_auth, patch_json_auth, post_json_auth, token_for, CountingGateway};
use serde_json::json;
use sqlx::PgPool;
use talentdesk_api::config::ServerConfig;
use talentdesk_db::repositories::{OutreachMessageRepo, SourcedCandidateRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ALL_DAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

fn app(pool: &PgPool, config: ServerConfig, gateway: &Arc<CountingGateway>) -> Router {
    common::build_test_app_with_gateway(pool.clone(), config, gateway.clone())
}

/// An active single-step email campaign with `recipients` freshly imported
/// candidates queued. Returns the campaign id and the candidate ids.
async fn active_campaign(pool: &PgPool, token: &str, recipients: usize) -> (i64, Vec<i64>) {
    let gateway = CountingGateway::new();
    let build = || app(pool, common::test_config(false), &gateway);

    let candidates: Vec<_> = (0..recipients)
        .map(|i| json!({ "name": format!("Cand{i} Tester"), "email": format!("cand{i}@example.com") }))
        .collect();
    let response = post_json_auth(build(), "/api/v1/sourcing/import", json!({ "candidates": candidates }), token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(build(), "/api/v1/sourcing/candidates?status=new", token).await;
    let ids: Vec<i64> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), recipients);

    let body = json!({
        "name": "Spring outreach",
        "sequence": [{
            "channel": "email",
            "subject_line": "Hello {{first_name}}",
            "message_body": "Hi {{first_name}}, {{sender_name}} here from {{company}}.",
            "send_after_hour": 0,
            "send_before_hour": 24,
            "send_on_days": ALL_DAYS,
        }],
    });
    let response = post_json_auth(build(), "/api/v1/campaigns", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = patch_json_auth(build(), &format!("/api/v1/campaigns/{id}/status"), json!({ "status": "active" }), token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        build(),
        &format!("/api/v1/campaigns/{id}/recipients"),
        json!({ "candidate_ids": ids }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let added = body_json(response).await;
    assert_eq!(added["data"]["queued"], recipients);
    assert_eq!(added["data"]["campaign"]["total_recipients"], recipients);

    (id, ids)
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn send_delivers_queue_and_feeds_analytics(pool: PgPool) {
    let (user, _) = create_user(&pool, "sender", "recruiter").await;
    let token = token_for(user.id, "recruiter");
    let (id, candidate_ids) = active_campaign(&pool, &token, 3).await;
    let gateway = CountingGateway::new();

    // Re-adding the same people queues nothing new.
    let response = post_json_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}/recipients"),
        json!({ "candidate_ids": [candidate_ids[0], 999_999] }),
        &token,
    )
    .await;
    let added = body_json(response).await;
    assert_eq!(added["data"]["queued"], 0);
    assert_eq!(added["data"]["skipped"], 1);
    assert_eq!(added["data"]["missing"], json!([999_999]));

    let uri = format!("/api/v1/campaigns/{id}/send");
    let response = post_json_auth(app(&pool, common::test_config(false), &gateway), &uri, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["data"]["attempted"], 3);
    assert_eq!(report["data"]["sent"], 3);
    assert_eq!(report["data"]["campaign"]["messages_sent"], 3);
    assert_eq!(gateway.calls(), 3);

    // Nothing left to send.
    let response = post_json_auth(app(&pool, common::test_config(false), &gateway), &uri, json!({}), &token).await;
    assert_eq!(body_json(response).await["data"]["attempted"], 0);
    assert_eq!(gateway.calls(), 3);

    for candidate_id in candidate_ids {
        let candidate = SourcedCandidateRepo::find_by_id(&pool, candidate_id).await.unwrap().unwrap();
        assert_eq!(candidate.status, "contacted");
    }

    let response = get_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}/analytics?days=7"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let analytics = body_json(response).await;
    assert_eq!(analytics["data"]["counters"]["messages_sent"], 3);
    let daily = analytics["data"]["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 7);
    let sent_today: i64 = daily.iter().map(|d| d["sent"].as_i64().unwrap_or(0)).sum();
    assert_eq!(sent_today, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_sends_dispatch_each_message_once(pool: PgPool) {
    let (user, _) = create_user(&pool, "racer", "recruiter").await;
    let token = token_for(user.id, "recruiter");
    let (id, _) = active_campaign(&pool, &token, 6).await;
    let gateway = CountingGateway::slow(Duration::from_millis(50));

    let uri = format!("/api/v1/campaigns/{id}/send");
    let (a, b) = tokio::join!(
        post_json_auth(app(&pool, common::test_config(false), &gateway), &uri, json!({}), &token),
        post_json_auth(app(&pool, common::test_config(false), &gateway), &uri, json!({}), &token),
    );
    let (a, b) = (body_json(a).await, body_json(b).await);

    let sent = a["data"]["sent"].as_i64().unwrap() + b["data"]["sent"].as_i64().unwrap();
    assert_eq!(sent, 6);
    assert_eq!(gateway.calls(), 6);

    let messages = OutreachMessageRepo::list_for_campaign(&pool, id).await.unwrap();
    assert!(messages.iter().all(|m| m.status == "sent"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn timed_out_send_still_records_every_outcome(pool: PgPool) {
    let (user, _) = create_user(&pool, "patient", "recruiter").await;
    let token = token_for(user.id, "recruiter");
    let (id, candidate_ids) = active_campaign(&pool, &token, 4).await;

    let gateway = CountingGateway::slow(Duration::from_millis(400));
    let mut config = common::test_config(false);
    config.request_timeout_secs = 1;

    let response = post_json_auth(app(&pool, config, &gateway), &format!("/api/v1/campaigns/{id}/send"), json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let mut messages = Vec::new();
    for _ in 0..50 {
        messages = OutreachMessageRepo::list_for_campaign(&pool, id).await.unwrap();
        if messages.iter().all(|m| m.status == "sent") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(messages.iter().all(|m| m.status == "sent" && m.external_id.is_some()));
    assert_eq!(gateway.calls(), 4);

    let contacted = SourcedCandidateRepo::find_many(&pool, &candidate_ids).await.unwrap();
    assert!(contacted.iter().all(|c| c.status == "contacted"));

    let response = get_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}"),
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["messages_sent"], 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn paused_campaign_does_not_send(pool: PgPool) {
    let (user, _) = create_user(&pool, "pauser", "recruiter").await;
    let token = token_for(user.id, "recruiter");
    let (id, _) = active_campaign(&pool, &token, 1).await;
    let gateway = CountingGateway::new();

    let response = patch_json_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}/status"),
        json!({ "status": "paused" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}/send"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(gateway.calls(), 0);
}

// ---------------------------------------------------------------------------
// Delivery callbacks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reply_callback_updates_message_candidate_and_counters(pool: PgPool) {
    let (user, _) = create_user(&pool, "listener", "recruiter").await;
    let token = token_for(user.id, "recruiter");
    let (id, candidate_ids) = active_campaign(&pool, &token, 1).await;
    let gateway = CountingGateway::new();

    post_json_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}/send"),
        json!({}),
        &token,
    )
    .await;
    let message = OutreachMessageRepo::list_for_campaign(&pool, id).await.unwrap().remove(0);
    let external_id = message.external_id.expect("sent message has an external id");

    let events = "/api/v1/outreach/events";
    let response = post_json_auth(
        app(&pool, common::test_config(false), &gateway),
        events,
        json!({ "message_id": external_id, "status": "replied" }),
        "wrong-key",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json_auth(
        app(&pool, common::test_config(false), &gateway),
        events,
        json!({ "message_id": external_id, "status": "replied" }),
        "callback-key",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["data"]["applied"], true);
    assert_eq!(outcome["data"]["status"], "replied");
    assert_eq!(outcome["data"]["campaign_id"], id);

    // A late "opened" does not downgrade the reply.
    let response = post_json_auth(
        app(&pool, common::test_config(false), &gateway),
        events,
        json!({ "message_id": external_id, "status": "opened" }),
        "callback-key",
    )
    .await;
    assert_eq!(body_json(response).await["data"]["applied"], false);

    let candidate = SourcedCandidateRepo::find_by_id(&pool, candidate_ids[0]).await.unwrap().unwrap();
    assert_eq!(candidate.status, "replied");

    let response = get_auth(
        app(&pool, common::test_config(false), &gateway),
        &format!("/api/v1/campaigns/{id}/analytics"),
        &token,
    )
    .await;
    let analytics = body_json(response).await;
    assert_eq!(analytics["data"]["counters"]["messages_replied"], 1);
    assert_eq!(analytics["data"]["rates"]["reply_rate"], 100.0);
}
