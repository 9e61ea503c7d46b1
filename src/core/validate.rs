// Domain validation for workout drafts, shared by every create and update path.
use time::Date;
use time::macros::format_description;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{FIELDS_REQUIRED, NUMBERS_REQUIRED, WorkoutDraft};

pub const SETS_RANGE: (i64, i64) = (1, 20);
pub const REPS_RANGE: (i64, i64) = (1, 50);
pub const WEIGHT_RANGE: (f64, f64) = (0.0, 1000.0);

pub fn is_valid_workout(draft: &WorkoutDraft) -> bool {
    validate_workout(draft).is_ok()
}

/// Returns the first violated rule as an `Invalid` error.
pub fn validate_workout(draft: &WorkoutDraft) -> Result<(), Error> {
    if draft.date.trim().is_empty() || draft.exercise.trim().is_empty() {
        return Err(invalid(FIELDS_REQUIRED));
    }
    if !is_calendar_date(&draft.date) {
        return Err(invalid("date must use YYYY-MM-DD"));
    }
    if draft.weight.is_nan() {
        return Err(invalid(NUMBERS_REQUIRED));
    }
    if !(SETS_RANGE.0..=SETS_RANGE.1).contains(&draft.sets) {
        return Err(invalid("sets must be between 1 and 20"));
    }
    if !(REPS_RANGE.0..=REPS_RANGE.1).contains(&draft.reps) {
        return Err(invalid("reps must be between 1 and 50"));
    }
    if draft.weight < WEIGHT_RANGE.0 || draft.weight > WEIGHT_RANGE.1 {
        return Err(invalid("weight must be between 0 and 1000"));
    }
    Ok(())
}

fn is_calendar_date(value: &str) -> bool {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).is_ok()
}

fn invalid(message: &str) -> Error {
    Error::new(ErrorKind::Invalid).with_message(message)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_workout, validate_workout};
    use crate::core::error::ErrorKind;
    use crate::core::record::WorkoutDraft;

    fn valid() -> WorkoutDraft {
        WorkoutDraft::new("2026-01-05", "Bench Press", 3, 8, 135.0)
    }

    #[test]
    fn accepts_valid_drafts_including_bounds() {
        assert!(is_valid_workout(&valid()));
        for (sets, reps, weight) in [(1, 1, 0.0), (20, 50, 1000.0), (10, 25, 512.5)] {
            let draft = WorkoutDraft {
                sets,
                reps,
                weight,
                ..valid()
            };
            assert!(is_valid_workout(&draft), "{draft:?}");
        }
    }

    #[test]
    fn rejects_each_boundary_violation() {
        let cases = [
            WorkoutDraft { sets: 0, ..valid() },
            WorkoutDraft { sets: 21, ..valid() },
            WorkoutDraft { reps: 0, ..valid() },
            WorkoutDraft { reps: 51, ..valid() },
            WorkoutDraft { weight: -1.0, ..valid() },
            WorkoutDraft { weight: 1001.0, ..valid() },
            WorkoutDraft { weight: f64::NAN, ..valid() },
            WorkoutDraft { date: String::new(), ..valid() },
            WorkoutDraft { exercise: String::new(), ..valid() },
            WorkoutDraft { exercise: "   ".to_string(), ..valid() },
        ];
        for draft in cases {
            assert!(!is_valid_workout(&draft), "{draft:?}");
        }
    }

    #[test]
    fn rejects_malformed_dates() {
        for date in ["2026-13-01", "2026-02-30", "01/05/2026", "yesterday"] {
            let draft = WorkoutDraft {
                date: date.to_string(),
                ..valid()
            };
            let err = validate_workout(&draft).expect_err("err");
            assert_eq!(err.kind(), ErrorKind::Invalid);
            assert_eq!(err.message(), Some("date must use YYYY-MM-DD"));
        }
    }

    #[test]
    fn reports_first_violated_rule() {
        let draft = WorkoutDraft {
            sets: 0,
            reps: 0,
            ..valid()
        };
        let err = validate_workout(&draft).expect_err("err");
        assert_eq!(err.message(), Some("sets must be between 1 and 20"));
    }
}
