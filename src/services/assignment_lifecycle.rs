//! Allowed assignment status transitions.
//!
//! | from     | to        |
//! |----------|-----------|
//! | pending  | accepted  |
//! | pending  | rejected  |
//! | accepted | completed |

use crate::db::types::AssignmentStatus;

const TRANSITIONS: &[(AssignmentStatus, AssignmentStatus)] = &[
    (AssignmentStatus::Pending, AssignmentStatus::Accepted),
    (AssignmentStatus::Pending, AssignmentStatus::Rejected),
    (AssignmentStatus::Accepted, AssignmentStatus::Completed),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InvalidTransition {
    pub(crate) from: AssignmentStatus,
    pub(crate) to: AssignmentStatus,
}

pub(crate) fn check(
    from: AssignmentStatus,
    to: AssignmentStatus,
) -> Result<AssignmentStatus, InvalidTransition> {
    if TRANSITIONS.contains(&(from, to)) {
        Ok(to)
    } else {
        Err(InvalidTransition { from, to })
    }
}

/// Statuses an invigilator may answer an offer with.
pub(crate) fn is_response(status: AssignmentStatus) -> bool {
    matches!(status, AssignmentStatus::Accepted | AssignmentStatus::Rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssignmentStatus::*;

    const ALL: [AssignmentStatus; 4] = [Pending, Accepted, Rejected, Completed];

    #[test]
    fn only_listed_transitions_pass() {
        for from in ALL {
            for to in ALL {
                let expected = matches!(
                    (from, to),
                    (Pending, Accepted) | (Pending, Rejected) | (Accepted, Completed)
                );
                assert_eq!(check(from, to).is_ok(), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn repeated_response_is_rejected() {
        assert_eq!(
            check(Accepted, Rejected),
            Err(InvalidTransition { from: Accepted, to: Rejected })
        );
        assert!(check(Rejected, Accepted).is_err());
        assert!(check(Accepted, Accepted).is_err());
    }

    #[test]
    fn completion_requires_acceptance() {
        assert!(check(Pending, Completed).is_err());
        assert!(check(Rejected, Completed).is_err());
        assert_eq!(check(Accepted, Completed), Ok(Completed));
    }

    #[test]
    fn responses_are_accept_or_reject() {
        assert!(is_response(Accepted));
        assert!(is_response(Rejected));
        assert!(!is_response(Pending));
        assert!(!is_response(Completed));
    }
}
