//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and updates where the API accepts them

pub mod account;
pub mod alternative;
pub mod attestation;
pub mod background_check;
pub mod flagged_upload;
pub mod link;
pub mod reservation;
pub mod selection;
pub mod tour;
