//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller, from a Bearer token or `session` cookie.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireRecruiter`] -- requires `recruiter` or `admin`.
//! - [`rbac::RequireAuth`] -- any authenticated caller.

pub mod auth;
pub mod rbac;
