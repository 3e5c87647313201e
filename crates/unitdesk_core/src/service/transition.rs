//! Unit status transition rules.
//!
//! Every move is allowed, including same-state moves, except
//! `Occupied -> Available`: an occupied unit has to pass through cleaning or
//! maintenance before it can be offered again.

use crate::model::unit::UnitStatus;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed message returned for the forbidden move.
pub const OCCUPIED_TO_AVAILABLE_ERR: &str = "Occupied unit cannot be made Available directly, \
must be either Cleaning In Progress or Maintenance Needed.";

/// Rejected status move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: UnitStatus,
    pub to: UnitStatus,
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(OCCUPIED_TO_AVAILABLE_ERR)
    }
}

impl Error for TransitionError {}

pub fn is_transition_allowed(from: UnitStatus, to: UnitStatus) -> bool {
    !matches!((from, to), (UnitStatus::Occupied, UnitStatus::Available))
}

pub fn check_transition(from: UnitStatus, to: UnitStatus) -> Result<(), TransitionError> {
    if is_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::{check_transition, is_transition_allowed, TransitionError};
    use crate::model::unit::UnitStatus;

    #[test]
    fn only_occupied_to_available_is_forbidden() {
        for from in UnitStatus::ALL {
            for to in UnitStatus::ALL {
                let expected = !(from == UnitStatus::Occupied && to == UnitStatus::Available);
                assert_eq!(is_transition_allowed(from, to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn check_reports_both_ends() {
        let err = check_transition(UnitStatus::Occupied, UnitStatus::Available).unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: UnitStatus::Occupied,
                to: UnitStatus::Available,
            }
        );
        assert!(err.to_string().starts_with("Occupied unit cannot be made Available"));
    }
}
