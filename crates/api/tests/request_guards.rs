//! Requests that are answered before any database access: authentication,
//! role checks, input validation and routing.
//!
//! The app runs against a lazy pool that is never connected.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, lazy_pool, post_json, post_json_auth, token_for};
use serde_json::json;

fn app() -> axum::Router {
    common::build_test_app(lazy_pool())
}

fn poc_app() -> axum::Router {
    common::build_test_app_with(lazy_pool(), common::test_config(true))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_401_with_login_url() {
    let response = post_json(app(), "/api/v1/jobs", json!({ "title": "Engineer" })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["login_url"], "/login");
}

#[tokio::test]
async fn garbage_token_is_401() {
    let response = get_auth(app(), "/api/v1/jobs", "not.a.jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn viewer_cannot_write() {
    let token = token_for(7, "viewer");
    let response =
        post_json_auth(app(), "/api/v1/jobs", json!({ "title": "Engineer" }), &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_json(response).await.get("login_url").is_none());
}

#[tokio::test]
async fn recruiter_cannot_approve_offers() {
    let token = token_for(7, "recruiter");
    let response = post_json_auth(app(), "/api/v1/offers/1/approve", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn auth_disabled_mode_lets_requests_through() {
    // Reaches validation, so the operator identity was accepted.
    let response = post_json(poc_app(), "/api/v1/sourcing/search", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

async fn recruiter_post(uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let token = token_for(3, "recruiter");
    let response = post_json_auth(app(), uri, body, &token).await;
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn blank_job_title_rejected() {
    let (status, json) = recruiter_post("/api/v1/jobs", json!({ "title": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn campaign_needs_a_name() {
    let (status, _) = recruiter_post("/api/v1/campaigns", json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn offer_with_bad_email_rejected() {
    let body = json!({
        "candidate_name": "Ada Lovelace",
        "candidate_email": "ada-at-example",
        "position_title": "Staff Engineer",
        "base_salary": 150000,
    });
    let (status, json) = recruiter_post("/api/v1/offers", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn offer_with_negative_salary_rejected() {
    let body = json!({
        "candidate_name": "Ada Lovelace",
        "candidate_email": "ada@example.com",
        "position_title": "Staff Engineer",
        "base_salary": -1,
    });
    let (status, _) = recruiter_post("/api/v1/offers", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_min_fit_score_out_of_range() {
    let token = token_for(3, "viewer");
    let body = json!({ "skills": ["Rust"], "min_fit_score": 150 });
    let response = post_json_auth(app(), "/api/v1/sourcing/search", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn phone_interview_validity_bounded() {
    let body = json!({ "candidate_name": "Ada", "valid_for_days": 0 });
    let (status, _) = recruiter_post("/api/v1/phone-interviews", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_with_bad_address_rejected() {
    let body = json!({ "to": "nobody", "subject": "Hello", "body": "Hi there" });
    let (status, _) = recruiter_post("/api/v1/emails/send", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_subject_required() {
    let body = json!({ "to": "ada@example.com", "subject": " ", "body": "Hi there" });
    let (status, _) = recruiter_post("/api/v1/emails/send", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Public endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_interview_token_is_404() {
    let response = get(app(), "/api/v1/phone-interview/not-a-real-token").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn outreach_callback_requires_service_key() {
    let body = json!({ "message_id": "ext-1", "status": "opened" });
    let response = post_json(app(), "/api/v1/outreach/events", body.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json_auth(app(), "/api/v1/outreach/events", body, "wrong-key").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Routing and middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(app(), "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let notes = "x".repeat(talentdesk_api::router::MAX_BODY_BYTES + 1);
    let body = json!({ "candidates": [{ "name": "Ada Lovelace", "notes": notes }] });
    let response = post_json_auth(app(), "/api/v1/sourcing/import", body, &token_for(3, "recruiter")).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = get(app(), "/api/v1/does-not-exist").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let response = get(app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["outreach_live"], false);
    assert!(json["version"].is_string());
}
