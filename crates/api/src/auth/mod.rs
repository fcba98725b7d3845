//! Session tokens.
//!
//! - [`jwt`] -- access-token validation (tokens are shared with the identity
//!   provider through `JWT_SECRET`) and signed link-invitation tokens.

pub mod jwt;
