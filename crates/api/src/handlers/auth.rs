//! Handlers for the `/auth` resource (login, refresh, logout).
//!
//! Login and refresh return the tokens in the body for API clients and
//! also set the access token as an `HttpOnly` `session` cookie for the
//! dashboard.

use axum::extract::State;
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use talentdesk_core::error::CoreError;
use talentdesk_core::roles::Role;
use talentdesk_core::types::DbId;
use talentdesk_db::models::session::CreateSession;
use talentdesk_db::models::user::User;
use talentdesk_db::repositories::{SessionRepo, UserRepo};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::state::AppState;

/// Consecutive failures before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;

const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// What the dashboard should enable for this operator.
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_write: bool,
    pub can_approve_offers: bool,
}

impl From<Role> for Capabilities {
    fn from(role: Role) -> Self {
        Self {
            can_write: role.can_write(),
            can_approve_offers: role.can_approve_offers(),
        }
    }
}

type WithCookie<T> = ([(HeaderName, String); 1], Json<T>);

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<WithCookie<AuthResponse>> {
    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid username or password".into()));

    let user = UserRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(invalid)?;
    ensure_can_sign_in(&user, Utc::now())?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        record_failed_login(&state, &user).await?;
        return Err(invalid());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role = stored_role(&user)?;
    tracing::info!(user_id = user.id, %role, "Operator signed in");

    let response = issue_session(&state, &user, role, user_agent(&headers)).await?;
    Ok(with_session_cookie(&state, response))
}

/// POST /api/v1/auth/refresh
///
/// Rotates the refresh token: the presented one is revoked. The role is
/// re-read from `users`, so a demotion takes effect at the next refresh.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<WithCookie<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;
    SessionRepo::revoke(&state.pool, session.id).await?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;
    ensure_can_sign_in(&user, Utc::now())?;
    let role = stored_role(&user)?;

    let response = issue_session(&state, &user, role, user_agent(&headers)).await?;
    Ok(with_session_cookie(&state, response))
}

/// POST /api/v1/auth/logout
///
/// Revokes every session of the caller and clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<(StatusCode, [(HeaderName, String); 1])> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie())],
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

fn clear_session_cookie() -> String {
    session_cookie("", 0)
}

fn with_session_cookie(state: &AppState, response: AuthResponse) -> WithCookie<AuthResponse> {
    let cookie = session_cookie(
        &response.access_token,
        state.config.jwt.access_ttl_secs(),
    );
    ([(SET_COOKIE, cookie)], Json(response))
}

/// Deactivated and temporarily locked accounts cannot sign in or refresh.
fn ensure_can_sign_in(user: &User, now: chrono::DateTime<Utc>) -> Result<(), CoreError> {
    if !user.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".into()));
    }
    if user.locked_until.is_some_and(|until| until > now) {
        return Err(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        ));
    }
    Ok(())
}

/// Count a bad password and lock the account once the limit is reached.
async fn record_failed_login(state: &AppState, user: &User) -> AppResult<()> {
    UserRepo::increment_failed_login(&state.pool, user.id).await?;
    if user.failed_login_count + 1 >= MAX_FAILED_ATTEMPTS {
        let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
        tracing::warn!(user_id = user.id, "Account locked after repeated failed logins");
    }
    Ok(())
}

/// The user's role. The `CHECK` on `users.role` makes a parse failure a
/// schema mismatch, not a client error.
fn stored_role(user: &User) -> AppResult<Role> {
    user.role.parse().map_err(|_| {
        AppError::InternalError(format!("User {} has unknown role '{}'", user.id, user.role))
    })
}

/// Mint an access token for `role`, persist a refresh session and build
/// the response.
async fn issue_session(
    state: &AppState,
    user: &User,
    role: Role,
    user_agent: Option<String>,
) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &user.username, role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at: Utc::now() + chrono::Duration::days(jwt.refresh_token_expiry_days),
            user_agent,
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: jwt.access_ttl_secs(),
        user: UserInfo {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role,
            capabilities: role.into(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc", 900);
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        assert!(clear_session_cookie().starts_with("session=;"));
        assert!(clear_session_cookie().ends_with("Max-Age=0"));
    }

    fn user(active: bool, locked_until: Option<chrono::DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: 5,
            username: "dana".into(),
            email: "dana@example.com".into(),
            password_hash: String::new(),
            role: "recruiter".into(),
            is_active: active,
            last_login_at: None,
            failed_login_count: 0,
            locked_until,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn inactive_or_locked_accounts_cannot_sign_in() {
        let now = Utc::now();
        assert!(ensure_can_sign_in(&user(true, None), now).is_ok());
        assert!(ensure_can_sign_in(&user(false, None), now).is_err());
        let locked = user(true, Some(now + chrono::Duration::minutes(5)));
        assert!(ensure_can_sign_in(&locked, now).is_err());
        let lapsed = user(true, Some(now - chrono::Duration::minutes(5)));
        assert!(ensure_can_sign_in(&lapsed, now).is_ok());
    }

    #[test]
    fn capabilities_follow_role() {
        let recruiter = Capabilities::from(Role::Recruiter);
        assert!(recruiter.can_write && !recruiter.can_approve_offers);
        assert!(Capabilities::from(Role::Admin).can_approve_offers);
        assert!(!Capabilities::from(Role::Viewer).can_write);
    }

    #[test]
    fn corrupt_stored_role_is_internal() {
        let mut u = user(true, None);
        u.role = "owner".into();
        assert!(matches!(stored_role(&u), Err(AppError::InternalError(_))));
    }
}
