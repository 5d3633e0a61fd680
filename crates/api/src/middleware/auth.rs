//! Authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use talentdesk_core::error::CoreError;
use talentdesk_core::roles::Role;
use talentdesk_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Cookie carrying the access token for browser sessions.
pub const SESSION_COOKIE: &str = "session";

/// User id reported for every request when authentication is disabled.
pub const POC_OPERATOR_ID: DbId = 0;

const POC_OPERATOR_NAME: &str = "operator";

/// The authenticated caller.
///
/// The token is read from `Authorization: Bearer <token>` first and from
/// the `session` cookie otherwise. With `AUTH_DISABLED` on, every request
/// resolves to an admin operator without looking at either.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    fn poc_operator() -> Self {
        Self {
            user_id: POC_OPERATOR_ID,
            username: POC_OPERATOR_NAME.to_string(),
            role: Role::Admin,
        }
    }

    /// The id to store in `created_by`-style columns. The proof-of-concept
    /// operator has no `users` row.
    pub fn db_id(&self) -> Option<DbId> {
        (self.user_id != POC_OPERATOR_ID).then_some(self.user_id)
    }

    /// Label recorded on negotiation notes, e.g. `recruiter:dana`.
    pub fn actor(&self) -> String {
        format!("{}:{}", self.role, self.username)
    }
}

/// Pull the `session` value out of a `Cookie` header.
fn session_cookie(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn bearer_or_cookie(parts: &Parts) -> Result<&str, AppError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().unwrap_or_default();
        return value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        });
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_cookie)
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Authentication required".into()))
        })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.auth_disabled {
            return Ok(AuthUser::poc_operator());
        }

        let token = bearer_or_cookie(parts)?;
        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
