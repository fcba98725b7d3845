//! Age computation and the age bands that drive the minor checklist.

use chrono::NaiveDate;
use serde::Serialize;

/// Age at which a student no longer needs a linked guardian.
pub const ADULT_AGE: u32 = 18;

/// Oldest age at which a student may still book a tour.
pub const MAX_STUDENT_AGE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    /// Under 18: needs a linked guardian.
    Minor,
    /// 18 through 20: books without a guardian.
    YoungAdult,
    /// Over 20: not eligible for student tours.
    OverAge,
}

/// Completed years between `birthdate` and `today`.
///
/// Calendar-aware: the year only counts once the birthday has been reached.
/// Returns `None` for a birthdate in the future.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(birthdate)
}

/// Age band for an optional birthdate. `None` when the birthdate is missing
/// or lies in the future.
pub fn band_on(birthdate: Option<NaiveDate>, today: NaiveDate) -> Option<AgeBand> {
    birthdate.and_then(|b| age_on(b, today)).map(age_band)
}

pub fn age_band(age: u32) -> AgeBand {
    if age < ADULT_AGE {
        AgeBand::Minor
    } else if age <= MAX_STUDENT_AGE {
        AgeBand::YoungAdult
    } else {
        AgeBand::OverAge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn birthday_not_yet_reached_this_year() {
        assert_eq!(age_on(date(2008, 6, 15), date(2026, 6, 14)), Some(17));
        assert_eq!(age_on(date(2008, 6, 15), date(2026, 6, 15)), Some(18));
    }

    #[test]
    fn exactly_twenty_today_is_still_a_student() {
        let today = date(2026, 3, 10);
        let age = age_on(date(2006, 3, 10), today).unwrap();
        assert_eq!(age, 20);
        assert_eq!(age_band(age), AgeBand::YoungAdult);
    }

    #[test]
    fn turned_twenty_one_yesterday_is_over_age() {
        let today = date(2026, 3, 10);
        let age = age_on(date(2005, 3, 9), today).unwrap();
        assert_eq!(age, 21);
        assert_eq!(age_band(age), AgeBand::OverAge);
    }

    #[test]
    fn leap_day_birthday() {
        assert_eq!(age_on(date(2008, 2, 29), date(2026, 2, 28)), Some(17));
        assert_eq!(age_on(date(2008, 2, 29), date(2026, 3, 1)), Some(18));
    }

    #[test]
    fn future_birthdate_has_no_age() {
        assert_eq!(age_on(date(2030, 1, 1), date(2026, 1, 1)), None);
    }

    #[test]
    fn seventeen_is_a_minor() {
        assert_eq!(age_band(17), AgeBand::Minor);
        assert_eq!(age_band(18), AgeBand::YoungAdult);
    }

    #[test]
    fn band_needs_a_usable_birthdate() {
        let today = date(2026, 3, 10);
        assert_eq!(band_on(None, today), None);
        assert_eq!(band_on(Some(date(2030, 1, 1)), today), None);
        assert_eq!(band_on(Some(date(2000, 1, 1)), today), Some(AgeBand::OverAge));
    }
}
