//! Tour reservation API server library.
//!
//! The binary and the integration tests both build on these modules:
//! configuration, shared state, error mapping, the eligibility engine and
//! the HTTP routes.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod scanner;
pub mod state;
pub mod storage;
