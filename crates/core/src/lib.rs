//! Domain logic for school-tour reservations.
//!
//! Everything in this crate is pure: no database, no I/O. Callers load the
//! relevant rows and hand plain facts in; the functions here decide what the
//! account must do next and how seats are distributed.

pub mod age;
pub mod allocation;
pub mod cart;
pub mod checklist;
pub mod documents;
pub mod error;
pub mod link;
pub mod prerequisites;
pub mod roles;
pub mod signature;
pub mod types;
