//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated account from a JWT Bearer token.
//! - [`rbac::RequireGuardian`] -- Requires the `guardian` role.
//! - [`rbac::RequireMember`] -- Requires `guardian` or `minor` (anyone who books tours).
//! - [`rbac::RequireStaff`] -- Requires the `staff` role.

pub mod auth;
pub mod rbac;
