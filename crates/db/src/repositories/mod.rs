//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod account_repo;
pub mod alternative_repo;
pub mod attestation_repo;
pub mod background_check_repo;
pub mod flagged_upload_repo;
pub mod link_repo;
pub mod reservation_repo;
pub mod selection_repo;
pub mod tour_repo;

pub use account_repo::AccountRepo;
pub use alternative_repo::AlternativeChoiceRepo;
pub use attestation_repo::{CodeOfConductRepo, ConsentRepo};
pub use background_check_repo::BackgroundCheckRepo;
pub use flagged_upload_repo::FlaggedUploadRepo;
pub use link_repo::LinkRepo;
pub use reservation_repo::ReservationRepo;
pub use selection_repo::SelectionRepo;
pub use tour_repo::TourRepo;
