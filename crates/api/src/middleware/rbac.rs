//! Role-based access control.
//!
//! The extractors wrap [`AuthUser`] and reject callers whose [`Role`] is
//! too weak for the whole endpoint. Checks that depend on the record being
//! touched, such as who may decide a pending offer, are plain functions
//! called once the record is loaded.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use talentdesk_core::error::CoreError;
use talentdesk_core::offer::{OfferAction, OfferStatus};
use talentdesk_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn approve(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `recruiter` or `admin`. Every mutating endpoint uses this.
pub struct RequireRecruiter(pub AuthUser);

impl FromRequestParts<AppState> for RequireRecruiter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.can_write() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Recruiter or Admin role required".into(),
            )));
        }
        Ok(RequireRecruiter(user))
    }
}

/// Any authenticated caller, viewers included.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}

/// Reject `user` unless their role may apply `action` to an offer that is
/// currently `status`.
pub fn authorize_offer_action(
    user: &AuthUser,
    status: OfferStatus,
    action: OfferAction,
) -> Result<(), AppError> {
    if user.role.may_apply_offer_action(status, action) {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(format!(
        "A {} cannot {action} an offer that is {status}",
        user.role
    ))))
}
