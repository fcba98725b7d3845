//! Checklist orchestration.
//!
//! Gathers everything the checklist needs for one account and one tour,
//! runs the pure evaluation from `tourdesk_core::checklist`, and on submit
//! hands an eligible batch to the seat allocator.

use chrono::Utc;
use serde::Serialize;
use tourdesk_core::checklist::{
    Attendance, ChecklistDecision, ChecklistStep, ChecklistSubject, GuardianFacts, MinorFacts,
};
use tourdesk_core::error::CoreError;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::Account;
use tourdesk_db::models::tour::TourListing;
use tourdesk_db::repositories::{AccountRepo, LinkRepo, SelectionRepo, TourRepo};

use super::allocator::{allocate, Allocation};
use super::prerequisites::PrerequisiteChecker;
use crate::error::AppResult;
use crate::state::AppState;

/// Links still awaiting approval count as linked.
const INCLUDE_PENDING_LINKS: bool = true;

/// A checklist decision with its client route resolved.
#[derive(Debug, Serialize)]
pub struct ChecklistView {
    pub tour_id: DbId,
    pub step: ChecklistStep,
    pub redirect_path: String,
    pub decision: ChecklistDecision,
}

impl ChecklistView {
    fn new(tour_id: DbId, decision: ChecklistDecision) -> Self {
        Self {
            tour_id,
            step: decision.step(),
            redirect_path: decision.redirect().path(tour_id),
            decision,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    #[serde(flatten)]
    pub checklist: ChecklistView,
    /// Present only when the checklist passed and seats were requested.
    pub allocation: Option<Allocation>,
}

/// Evaluate the checklist for `user_id` on `tour_id`. Never writes.
pub async fn evaluate(state: &AppState, user_id: DbId, tour_id: DbId) -> AppResult<ChecklistView> {
    let (_, decision) = decide(state, user_id, tour_id).await?;
    Ok(ChecklistView::new(tour_id, decision))
}

/// Evaluate the checklist and, if it passes, reserve seats for the
/// selected students (or the student themself).
pub async fn submit(state: &AppState, user_id: DbId, tour_id: DbId) -> AppResult<SubmitOutcome> {
    let (account, decision) = decide(state, user_id, tour_id).await?;

    let allocation = match &decision {
        ChecklistDecision::Eligible { reserve, .. } => {
            let allocation = allocate(state, &account, tour_id, reserve).await?;
            if account.role()? == Role::Guardian {
                SelectionRepo::mark_reserved(&state.pool, account.id, tour_id).await?;
            }
            Some(allocation)
        }
        _ => None,
    };

    tracing::info!(
        user_id,
        tour_id,
        step = ?decision.step(),
        allocated = allocation.is_some(),
        "Checklist submitted"
    );

    Ok(SubmitOutcome {
        checklist: ChecklistView::new(tour_id, decision),
        allocation,
    })
}

async fn decide(
    state: &AppState,
    user_id: DbId,
    tour_id: DbId,
) -> AppResult<(Account, ChecklistDecision)> {
    let account = AccountRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Account",
            id: user_id,
        })?;
    let tour = TourRepo::find_listing(&state.pool, tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: tour_id,
        })?;

    let subject = gather_subject(state, &account, &tour).await?;
    let decision = subject.evaluate();

    tracing::debug!(user_id, tour_id, step = ?decision.step(), "Checklist evaluated");
    Ok((account, decision))
}

/// Collect the facts for `account`'s role.
pub async fn gather_subject(
    state: &AppState,
    account: &Account,
    tour: &TourListing,
) -> AppResult<ChecklistSubject> {
    let pool = &state.pool;
    let policy = state.config.eligibility;
    let checker = PrerequisiteChecker::new(pool);
    let role = account.role()?;

    let code_of_conduct_signed = checker
        .has_signed_code_of_conduct(account.id, policy.code_of_conduct_days)
        .await?;
    let photo_id_on_file = checker.has_valid_photo_id(account.id).await?;

    match role {
        Role::Guardian => {
            let has_linked_minor =
                !LinkRepo::linked_account_ids(pool, role, account.id, INCLUDE_PENDING_LINKS)
                    .await?
                    .is_empty();

            let selection = SelectionRepo::find(pool, account.id, tour.id).await?;
            let (selected_students, waitlist_acknowledged, attendance) = match &selection {
                Some(s) => (s.student_ids.clone(), s.waitlist_acknowledged, s.attendance()?),
                None => (Vec::new(), false, None),
            };

            let student_birthdates = AccountRepo::find_many(pool, &selected_students)
                .await?
                .into_iter()
                .map(|student| (student.id, student.birthdate))
                .collect();

            let mut students_missing_consent = Vec::new();
            for &student_id in &selected_students {
                if !checker
                    .has_signed_consent(student_id, tour.id, policy.consent_days)
                    .await?
                {
                    students_missing_consent.push(student_id);
                }
            }

            let background_check_current = if attendance == Some(Attendance::Yes) {
                checker
                    .has_recent_background_check(account.id, policy.background_check_days)
                    .await?
            } else {
                false
            };

            Ok(ChecklistSubject::Guardian(GuardianFacts {
                profile_complete: account.profile_complete(),
                has_linked_minor,
                selected_students,
                student_birthdates,
                today: Utc::now().date_naive(),
                available_seats: tour.available_seats(),
                waitlist_acknowledged,
                attendance,
                students_missing_consent,
                code_of_conduct_signed,
                photo_id_on_file,
                background_check_current,
            }))
        }
        Role::Minor => {
            let has_linked_guardian =
                !LinkRepo::linked_account_ids(pool, role, account.id, INCLUDE_PENDING_LINKS)
                    .await?
                    .is_empty();

            Ok(ChecklistSubject::Minor(MinorFacts {
                student_id: account.id,
                birthdate: account.birthdate,
                today: Utc::now().date_naive(),
                has_linked_guardian,
                code_of_conduct_signed,
                photo_id_on_file,
            }))
        }
        Role::Staff => Err(CoreError::Forbidden(
            "Staff accounts do not book tours".into(),
        )
        .into()),
    }
}
