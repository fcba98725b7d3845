//! Reservation workflow services.
//!
//! Handlers stay thin; the multi-step flows live here:
//!
//! - [`prerequisites`] -- read-only checks over stored attestations.
//! - [`linking`] -- guardian/minor link requests, invitations and signup
//!   resolution.
//! - [`checklist`] -- gathers facts for an account and runs the checklist.
//! - [`allocator`] -- prices a tour and reserves seats for a batch of students.

pub mod allocator;
pub mod checklist;
pub mod linking;
pub mod prerequisites;
