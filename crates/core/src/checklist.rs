//! Reservation checklist.
//!
//! Walks an account through the prerequisites for booking a tour. Each role
//! has its own ordered table of gates; the first gate that does not pass
//! decides where the account is sent next. Evaluation is pure: the caller
//! gathers [`GuardianFacts`] or [`MinorFacts`] and the same facts always give
//! the same [`ChecklistDecision`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::age::{band_on, AgeBand, MAX_STUDENT_AGE};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Steps and redirects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStep {
    ProfileIncomplete,
    NoLinkedCounterpart,
    NoStudentsSelected,
    StudentProfileIncomplete,
    SelectionExceedsAvailableSeats,
    AttendanceUndeclared,
    ConsentMissing,
    CodeOfConductMissing,
    PhotoIdMissing,
    BackgroundCheckMissing,
    Eligible,
    Ineligible,
}

/// Where the client should send the account next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Redirect {
    ProfileForm,
    LinkAccounts,
    SelectStudents,
    /// A guardian completes a linked student's profile.
    StudentProfile { student_id: DbId },
    WaitlistWarning,
    DeclareAttendance,
    SignConsent { student_id: DbId },
    SignCodeOfConduct,
    UploadPhotoId,
    SubmitBackgroundCheck,
    Cart,
    Home,
}

impl Redirect {
    /// Client route for this redirect in the context of `tour_id`.
    pub fn path(&self, tour_id: DbId) -> String {
        match self {
            Self::ProfileForm => "/profile".to_string(),
            Self::LinkAccounts => "/links".to_string(),
            Self::SelectStudents => format!("/tours/{tour_id}/selection"),
            Self::StudentProfile { student_id } => format!("/links/{student_id}/profile"),
            Self::WaitlistWarning => format!("/tours/{tour_id}/waitlist-warning"),
            Self::DeclareAttendance => format!("/tours/{tour_id}/attendance"),
            Self::SignConsent { student_id } => format!("/tours/{tour_id}/consent/{student_id}"),
            Self::SignCodeOfConduct => "/code-of-conduct".to_string(),
            Self::UploadPhotoId => "/documents/photo-id".to_string(),
            Self::SubmitBackgroundCheck => "/documents/background-check".to_string(),
            Self::Cart => "/cart".to_string(),
            Self::Home => "/".to_string(),
        }
    }
}

/// Informational messages that accompany a decision without blocking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// More students were selected than there are free seats; the surplus
    /// will be waitlisted.
    SelectionExceedsAvailableSeats { selected: usize, available: i32 },
    /// The guardian said they will attend but no seat is left for them. The
    /// guardian is not waitlisted for their own seat.
    GuardianSeatUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChecklistDecision {
    Blocked {
        step: ChecklistStep,
        redirect: Redirect,
        notices: Vec<Notice>,
    },
    /// All gates passed: request seats for these students, in this order.
    Eligible {
        reserve: Vec<DbId>,
        notices: Vec<Notice>,
    },
    /// Terminal for this tour; retrying will not help.
    Ineligible { reason: String, redirect: Redirect },
}

impl ChecklistDecision {
    pub fn step(&self) -> ChecklistStep {
        match self {
            Self::Blocked { step, .. } => *step,
            Self::Eligible { .. } => ChecklistStep::Eligible,
            Self::Ineligible { .. } => ChecklistStep::Ineligible,
        }
    }

    pub fn redirect(&self) -> Redirect {
        match self {
            Self::Blocked { redirect, .. } | Self::Ineligible { redirect, .. } => *redirect,
            Self::Eligible { .. } => Redirect::Cart,
        }
    }
}

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

pub const ATTENDANCE_YES: &str = "yes";
pub const ATTENDANCE_NO: &str = "no";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attendance {
    Yes,
    No,
}

impl Attendance {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            ATTENDANCE_YES => Ok(Self::Yes),
            ATTENDANCE_NO => Ok(Self::No),
            _ => Err(CoreError::Validation(format!(
                "Attendance must be '{ATTENDANCE_YES}' or '{ATTENDANCE_NO}'"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => ATTENDANCE_YES,
            Self::No => ATTENDANCE_NO,
        }
    }
}

/// Guardians must leave a phone number; minors must give a birthdate so
/// their age band can be worked out.
pub fn is_profile_complete(role: Role, birthdate: Option<NaiveDate>, phone: Option<&str>) -> bool {
    match role {
        Role::Guardian => phone.is_some_and(|p| !p.trim().is_empty()),
        Role::Minor => birthdate.is_some(),
        Role::Staff => true,
    }
}

/// Everything the guardian checklist needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianFacts {
    pub profile_complete: bool,
    /// At least one minor is linked (pending links count).
    pub has_linked_minor: bool,
    /// Selected students in the order the guardian submitted them.
    pub selected_students: Vec<DbId>,
    /// Birthdates on file for the selected students. A student missing from
    /// this list is treated as having no birthdate.
    pub student_birthdates: Vec<(DbId, Option<NaiveDate>)>,
    pub today: NaiveDate,
    pub available_seats: i32,
    pub waitlist_acknowledged: bool,
    pub attendance: Option<Attendance>,
    /// Selected students without a current consent form, in selection order.
    pub students_missing_consent: Vec<DbId>,
    pub code_of_conduct_signed: bool,
    pub photo_id_on_file: bool,
    pub background_check_current: bool,
}

/// Everything the minor checklist needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinorFacts {
    pub student_id: DbId,
    pub birthdate: Option<NaiveDate>,
    pub today: NaiveDate,
    /// At least one guardian is linked (pending links count).
    pub has_linked_guardian: bool,
    pub code_of_conduct_signed: bool,
    pub photo_id_on_file: bool,
}

/// The subject of an evaluation. Staff accounts never book tours and have no
/// variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistSubject {
    Guardian(GuardianFacts),
    Minor(MinorFacts),
}

impl ChecklistSubject {
    pub fn evaluate(&self) -> ChecklistDecision {
        match self {
            Self::Guardian(facts) => run_gates(facts, GUARDIAN_GATES, |f| {
                f.selected_students.clone()
            }),
            Self::Minor(facts) => run_gates(facts, MINOR_GATES, |f| vec![f.student_id]),
        }
    }
}

// ---------------------------------------------------------------------------
// Gate tables
// ---------------------------------------------------------------------------

enum GateOutcome {
    Pass,
    Block(Redirect),
    Ineligible(String),
}

struct Gate<F> {
    step: ChecklistStep,
    check: fn(&F, &mut Vec<Notice>) -> GateOutcome,
}

const GUARDIAN_GATES: &[Gate<GuardianFacts>] = &[
    Gate {
        step: ChecklistStep::ProfileIncomplete,
        check: |f, _| pass_if(f.profile_complete, Redirect::ProfileForm),
    },
    Gate {
        step: ChecklistStep::NoLinkedCounterpart,
        check: |f, _| pass_if(f.has_linked_minor, Redirect::LinkAccounts),
    },
    Gate {
        step: ChecklistStep::NoStudentsSelected,
        check: |f, _| pass_if(!f.selected_students.is_empty(), Redirect::SelectStudents),
    },
    Gate {
        step: ChecklistStep::StudentProfileIncomplete,
        check: selected_student_ages,
    },
    Gate {
        step: ChecklistStep::SelectionExceedsAvailableSeats,
        check: guardian_seat_shortfall,
    },
    Gate {
        step: ChecklistStep::AttendanceUndeclared,
        check: guardian_attendance,
    },
    Gate {
        step: ChecklistStep::ConsentMissing,
        check: |f, _| match f.students_missing_consent.first() {
            Some(&student_id) => GateOutcome::Block(Redirect::SignConsent { student_id }),
            None => GateOutcome::Pass,
        },
    },
    Gate {
        step: ChecklistStep::CodeOfConductMissing,
        check: |f, _| pass_if(f.code_of_conduct_signed, Redirect::SignCodeOfConduct),
    },
    Gate {
        step: ChecklistStep::PhotoIdMissing,
        check: |f, _| pass_if(f.photo_id_on_file, Redirect::UploadPhotoId),
    },
    Gate {
        step: ChecklistStep::BackgroundCheckMissing,
        check: |f, _| {
            let required = f.attendance == Some(Attendance::Yes);
            pass_if(
                !required || f.background_check_current,
                Redirect::SubmitBackgroundCheck,
            )
        },
    },
];

const MINOR_GATES: &[Gate<MinorFacts>] = &[
    Gate {
        step: ChecklistStep::ProfileIncomplete,
        check: |f, _| pass_if(f.birthdate.is_some(), Redirect::ProfileForm),
    },
    Gate {
        step: ChecklistStep::Ineligible,
        check: minor_age,
    },
    Gate {
        step: ChecklistStep::NoLinkedCounterpart,
        check: |f, _| {
            let needs_guardian = minor_band(f) == Some(AgeBand::Minor);
            pass_if(!needs_guardian || f.has_linked_guardian, Redirect::LinkAccounts)
        },
    },
    Gate {
        step: ChecklistStep::CodeOfConductMissing,
        check: |f, _| pass_if(f.code_of_conduct_signed, Redirect::SignCodeOfConduct),
    },
    Gate {
        step: ChecklistStep::PhotoIdMissing,
        check: |f, _| pass_if(f.photo_id_on_file, Redirect::UploadPhotoId),
    },
];

fn pass_if(ok: bool, redirect: Redirect) -> GateOutcome {
    if ok {
        GateOutcome::Pass
    } else {
        GateOutcome::Block(redirect)
    }
}

/// Every selected student needs a birthdate on file and must be within the
/// student age limit.
fn selected_student_ages(f: &GuardianFacts, _: &mut Vec<Notice>) -> GateOutcome {
    for &student_id in &f.selected_students {
        let birthdate = f
            .student_birthdates
            .iter()
            .find(|(id, _)| *id == student_id)
            .and_then(|(_, b)| *b);
        match band_on(birthdate, f.today) {
            None => return GateOutcome::Block(Redirect::StudentProfile { student_id }),
            Some(AgeBand::OverAge) => return GateOutcome::Ineligible(over_age_reason()),
            Some(_) => {}
        }
    }
    GateOutcome::Pass
}

fn over_age_reason() -> String {
    format!("Student tours are limited to students aged {MAX_STUDENT_AGE} or younger")
}

fn guardian_seat_shortfall(f: &GuardianFacts, notices: &mut Vec<Notice>) -> GateOutcome {
    let selected = f.selected_students.len();
    let available = f.available_seats.max(0);
    if selected <= available as usize {
        return GateOutcome::Pass;
    }
    notices.push(Notice::SelectionExceedsAvailableSeats {
        selected,
        available,
    });
    pass_if(f.waitlist_acknowledged, Redirect::WaitlistWarning)
}

fn guardian_attendance(f: &GuardianFacts, notices: &mut Vec<Notice>) -> GateOutcome {
    match f.attendance {
        None => GateOutcome::Block(Redirect::DeclareAttendance),
        Some(Attendance::Yes) => {
            let seats_after_students = f.available_seats.max(0) as usize;
            if seats_after_students <= f.selected_students.len() {
                notices.push(Notice::GuardianSeatUnavailable);
            }
            GateOutcome::Pass
        }
        Some(Attendance::No) => GateOutcome::Pass,
    }
}

fn minor_band(f: &MinorFacts) -> Option<AgeBand> {
    band_on(f.birthdate, f.today)
}

fn minor_age(f: &MinorFacts, _: &mut Vec<Notice>) -> GateOutcome {
    match minor_band(f) {
        Some(AgeBand::OverAge) => GateOutcome::Ineligible(over_age_reason()),
        // A birthdate in the future is a data-entry error, not ineligibility.
        None => GateOutcome::Block(Redirect::ProfileForm),
        Some(_) => GateOutcome::Pass,
    }
}

fn run_gates<F>(
    facts: &F,
    gates: &[Gate<F>],
    reserve: impl FnOnce(&F) -> Vec<DbId>,
) -> ChecklistDecision {
    let mut notices = Vec::new();
    for gate in gates {
        match (gate.check)(facts, &mut notices) {
            GateOutcome::Pass => {}
            GateOutcome::Block(redirect) => {
                return ChecklistDecision::Blocked {
                    step: gate.step,
                    redirect,
                    notices,
                }
            }
            GateOutcome::Ineligible(reason) => {
                return ChecklistDecision::Ineligible {
                    reason,
                    redirect: Redirect::Home,
                }
            }
        }
    }
    ChecklistDecision::Eligible {
        reserve: reserve(facts),
        notices,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn born(years_before_today: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026 - years_before_today, 1, 15)
    }

    /// Select `ids`, all of them aged 14.
    fn selecting(ids: &[DbId], facts: GuardianFacts) -> GuardianFacts {
        GuardianFacts {
            selected_students: ids.to_vec(),
            student_birthdates: ids.iter().map(|&id| (id, born(14))).collect(),
            ..facts
        }
    }

    fn ready_guardian() -> GuardianFacts {
        GuardianFacts {
            profile_complete: true,
            has_linked_minor: true,
            selected_students: vec![11, 12],
            student_birthdates: vec![(11, born(14)), (12, born(16))],
            today: today(),
            available_seats: 5,
            waitlist_acknowledged: false,
            attendance: Some(Attendance::No),
            students_missing_consent: vec![],
            code_of_conduct_signed: true,
            photo_id_on_file: true,
            background_check_current: false,
        }
    }

    fn ready_minor(birthdate: NaiveDate) -> MinorFacts {
        MinorFacts {
            student_id: 11,
            birthdate: Some(birthdate),
            today: today(),
            has_linked_guardian: true,
            code_of_conduct_signed: true,
            photo_id_on_file: true,
        }
    }

    fn guardian(f: GuardianFacts) -> ChecklistDecision {
        ChecklistSubject::Guardian(f).evaluate()
    }

    fn minor(f: MinorFacts) -> ChecklistDecision {
        ChecklistSubject::Minor(f).evaluate()
    }

    #[test]
    fn ready_guardian_is_eligible_for_selected_students_in_order() {
        let decision = guardian(ready_guardian());
        assert_eq!(
            decision,
            ChecklistDecision::Eligible {
                reserve: vec![11, 12],
                notices: vec![]
            }
        );
    }

    #[test]
    fn first_failing_gate_wins() {
        let facts = GuardianFacts {
            profile_complete: false,
            has_linked_minor: false,
            ..ready_guardian()
        };
        assert_eq!(guardian(facts).step(), ChecklistStep::ProfileIncomplete);

        let facts = GuardianFacts {
            has_linked_minor: false,
            selected_students: vec![],
            ..ready_guardian()
        };
        assert_eq!(guardian(facts).redirect(), Redirect::LinkAccounts);
    }

    #[test]
    fn guardian_without_selection_goes_to_selection_form() {
        let facts = GuardianFacts {
            selected_students: vec![],
            ..ready_guardian()
        };
        assert_eq!(guardian(facts).redirect(), Redirect::SelectStudents);
    }

    #[test]
    fn seat_shortfall_warns_until_acknowledged() {
        let facts = GuardianFacts {
            available_seats: 2,
            ..selecting(&[1, 2, 3], ready_guardian())
        };
        assert_matches!(
            guardian(facts.clone()),
            ChecklistDecision::Blocked {
                step: ChecklistStep::SelectionExceedsAvailableSeats,
                redirect: Redirect::WaitlistWarning,
                ..
            }
        );

        let acknowledged = GuardianFacts {
            waitlist_acknowledged: true,
            ..facts
        };
        assert_eq!(
            guardian(acknowledged),
            ChecklistDecision::Eligible {
                reserve: vec![1, 2, 3],
                notices: vec![Notice::SelectionExceedsAvailableSeats {
                    selected: 3,
                    available: 2
                }],
            }
        );
    }

    #[test]
    fn over_age_selected_student_makes_the_batch_ineligible() {
        let facts = GuardianFacts {
            student_birthdates: vec![(11, born(14)), (12, born(25))],
            ..ready_guardian()
        };
        assert_matches!(
            guardian(facts),
            ChecklistDecision::Ineligible {
                redirect: Redirect::Home,
                ..
            }
        );
    }

    #[test]
    fn selected_student_without_birthdate_goes_to_their_profile() {
        let facts = GuardianFacts {
            student_birthdates: vec![(11, born(14))],
            ..ready_guardian()
        };
        let decision = guardian(facts);
        assert_eq!(decision.step(), ChecklistStep::StudentProfileIncomplete);
        assert_eq!(decision.redirect(), Redirect::StudentProfile { student_id: 12 });
        assert_eq!(decision.redirect().path(9), "/links/12/profile");
    }

    #[test]
    fn student_ages_are_checked_before_seat_shortfall() {
        let facts = GuardianFacts {
            available_seats: 0,
            student_birthdates: vec![(11, None), (12, born(16))],
            ..ready_guardian()
        };
        assert_eq!(guardian(facts).step(), ChecklistStep::StudentProfileIncomplete);
    }

    #[test]
    fn undeclared_attendance_blocks() {
        let facts = GuardianFacts {
            attendance: None,
            ..ready_guardian()
        };
        assert_eq!(guardian(facts).redirect(), Redirect::DeclareAttendance);
    }

    #[test]
    fn attending_guardian_without_a_seat_gets_a_notice_not_a_waitlist() {
        let facts = GuardianFacts {
            attendance: Some(Attendance::Yes),
            available_seats: 2,
            background_check_current: true,
            ..ready_guardian()
        };
        assert_eq!(
            guardian(facts),
            ChecklistDecision::Eligible {
                reserve: vec![11, 12],
                notices: vec![Notice::GuardianSeatUnavailable],
            }
        );
    }

    #[test]
    fn consent_is_requested_for_the_first_student_missing_it() {
        let facts = GuardianFacts {
            students_missing_consent: vec![12, 11],
            ..ready_guardian()
        };
        assert_eq!(
            guardian(facts).redirect(),
            Redirect::SignConsent { student_id: 12 }
        );
    }

    #[test]
    fn background_check_only_required_when_attending() {
        let not_attending = ready_guardian();
        assert_eq!(guardian(not_attending).step(), ChecklistStep::Eligible);

        let attending = GuardianFacts {
            attendance: Some(Attendance::Yes),
            ..ready_guardian()
        };
        assert_eq!(
            guardian(attending).redirect(),
            Redirect::SubmitBackgroundCheck
        );
    }

    #[test]
    fn code_of_conduct_precedes_photo_id() {
        let facts = GuardianFacts {
            code_of_conduct_signed: false,
            photo_id_on_file: false,
            ..ready_guardian()
        };
        assert_eq!(guardian(facts).redirect(), Redirect::SignCodeOfConduct);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let subject = ChecklistSubject::Guardian(GuardianFacts {
            available_seats: 1,
            waitlist_acknowledged: true,
            ..selecting(&[4, 5, 6], ready_guardian())
        });
        assert_eq!(subject.evaluate(), subject.evaluate());
    }

    #[test]
    fn minor_needs_birthdate_first() {
        let facts = MinorFacts {
            birthdate: None,
            ..ready_minor(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap())
        };
        assert_eq!(minor(facts).redirect(), Redirect::ProfileForm);
    }

    #[test]
    fn under_eighteen_needs_a_guardian() {
        let facts = MinorFacts {
            has_linked_guardian: false,
            ..ready_minor(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap())
        };
        assert_eq!(minor(facts).redirect(), Redirect::LinkAccounts);
    }

    #[test]
    fn young_adult_skips_guardian_link() {
        let facts = MinorFacts {
            has_linked_guardian: false,
            ..ready_minor(NaiveDate::from_ymd_opt(2007, 1, 1).unwrap())
        };
        assert_eq!(
            minor(facts),
            ChecklistDecision::Eligible {
                reserve: vec![11],
                notices: vec![]
            }
        );
    }

    #[test]
    fn exactly_twenty_is_eligible_and_twenty_one_is_not() {
        let twenty_today = NaiveDate::from_ymd_opt(2006, 9, 1).unwrap();
        assert_eq!(minor(ready_minor(twenty_today)).step(), ChecklistStep::Eligible);

        let twenty_one_yesterday = NaiveDate::from_ymd_opt(2005, 8, 31).unwrap();
        assert_matches!(
            minor(ready_minor(twenty_one_yesterday)),
            ChecklistDecision::Ineligible {
                redirect: Redirect::Home,
                ..
            }
        );
    }

    #[test]
    fn future_birthdate_sends_minor_back_to_profile() {
        let facts = ready_minor(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(minor(facts).redirect(), Redirect::ProfileForm);
    }

    #[test]
    fn profile_requirements_depend_on_role() {
        let birthdate = NaiveDate::from_ymd_opt(2010, 1, 1);
        assert!(is_profile_complete(Role::Guardian, None, Some("555-0100")));
        assert!(!is_profile_complete(Role::Guardian, birthdate, Some("  ")));
        assert!(is_profile_complete(Role::Minor, birthdate, None));
        assert!(!is_profile_complete(Role::Minor, None, Some("555-0100")));
    }

    #[test]
    fn redirect_paths_are_tour_scoped_where_needed() {
        assert_eq!(
            Redirect::SignConsent { student_id: 3 }.path(9),
            "/tours/9/consent/3"
        );
        assert_eq!(Redirect::SignCodeOfConduct.path(9), "/code-of-conduct");
    }
}
