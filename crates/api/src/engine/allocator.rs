//! Seat allocation for a batch of students.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tourdesk_core::allocation::{plan_batch, validate_batch, SeatStatus};
use tourdesk_core::error::CoreError;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::Account;
use tourdesk_db::models::reservation::{ReservationBatch, SeatRequest};
use tourdesk_db::repositories::{AccountRepo, ReservationRepo, TourRepo};
use tourdesk_events::Notification;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Summary of an allocated batch, as returned to the client.
#[derive(Debug, Serialize)]
pub struct Allocation {
    pub tour_id: DbId,
    pub confirmed: usize,
    pub waitlisted: usize,
    pub batch: ReservationBatch,
}

/// Reserve seats on `tour_id` for `student_ids`, in the order given.
///
/// Price and availability are resolved in one read before anything is
/// written; if they cannot be resolved no rows are written. Seats are then
/// claimed one student at a time inside a single transaction, so the first
/// students in the list get the remaining seats and the rest are waitlisted.
///
/// A guardian requester is recorded as the parent on every row. Everything
/// the receipt needs is read before the seats are claimed, so once the
/// transaction commits the call cannot fail.
pub async fn allocate(
    state: &AppState,
    requester: &Account,
    tour_id: DbId,
    student_ids: &[DbId],
) -> AppResult<Allocation> {
    validate_batch(student_ids)?;

    let listing = TourRepo::find_listing(&state.pool, tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: tour_id,
        })?;
    let pricing = listing.pricing()?;

    let planned = plan_batch(student_ids, pricing.available());
    tracing::debug!(
        tour_id,
        available = pricing.available(),
        planned_confirmed = planned
            .iter()
            .filter(|(_, s)| *s == SeatStatus::Confirmed)
            .count(),
        "Planned seat batch"
    );

    let snapshot = serde_json::to_value(pricing.snapshot(Utc::now()))
        .map_err(|e| AppError::InternalError(format!("Failed to encode pricing snapshot: {e}")))?;
    let parent_id = match requester.role()? {
        Role::Guardian => Some(requester.id),
        _ => None,
    };
    let requests: Vec<SeatRequest> = student_ids
        .iter()
        .map(|&student_id| SeatRequest {
            user_id: requester.id,
            parent_id,
            student_id,
            tour_id,
            price_cents: pricing.price_cents,
            pricing_snapshot: snapshot.clone(),
        })
        .collect();

    let student_names: HashMap<DbId, String> = AccountRepo::find_many(&state.pool, student_ids)
        .await?
        .into_iter()
        .map(|student| (student.id, student.name))
        .collect();

    let batch = ReservationRepo::reserve_seats(&state.pool, tour_id, &requests).await?;
    let confirmed = batch.count(SeatStatus::Confirmed);
    let waitlisted = batch.count(SeatStatus::Waitlisted);

    tracing::info!(
        user_id = requester.id,
        tour_id,
        confirmed,
        waitlisted,
        confirmed_added = batch.confirmed_added,
        "Seat batch allocated"
    );

    send_receipt(state, requester, &pricing.title, &batch, &student_names);

    Ok(Allocation {
        tour_id,
        confirmed,
        waitlisted,
        batch,
    })
}

fn send_receipt(
    state: &AppState,
    requester: &Account,
    tour_title: &str,
    batch: &ReservationBatch,
    student_names: &HashMap<DbId, String>,
) {
    let mut confirmed = Vec::new();
    let mut waitlisted = Vec::new();
    for assignment in &batch.assignments {
        let name = student_names
            .get(&assignment.student_id)
            .cloned()
            .unwrap_or_else(|| format!("Student #{}", assignment.student_id));
        match assignment.seat_status {
            SeatStatus::Confirmed => confirmed.push(name),
            SeatStatus::Waitlisted => waitlisted.push(name),
        }
    }

    state.notifier.dispatch(Notification::reservation_receipt(
        &requester.email,
        tour_title,
        &confirmed,
        &waitlisted,
    ));
}
