use sqlx::PgExecutor;

use crate::core::time::primitive_now_utc;
use crate::db::types::{AssignmentStatus, NotificationKind, UserStatus};
use crate::repositories;
use crate::repositories::notifications::CreateNotification;

pub(crate) const NEW_ASSIGNMENT_TITLE: &str = "New Exam Assignment";
pub(crate) const CANCELLED_TITLE: &str = "Assignment Cancelled";
pub(crate) const ACCOUNT_STATUS_TITLE: &str = "Account Status Updated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Message {
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) kind: NotificationKind,
}

pub(crate) fn new_assignment(exam_title: &str) -> Message {
    Message {
        title: NEW_ASSIGNMENT_TITLE.to_string(),
        body: format!(
            "You have been assigned to invigilate the exam: {exam_title}. Please check your assignments."
        ),
        kind: NotificationKind::Assignment,
    }
}

pub(crate) fn assignment_response(
    invigilator_name: &str,
    status: AssignmentStatus,
    exam_title: &str,
) -> Message {
    let label = status.as_str();
    let mut title_label = label.to_string();
    if let Some(first) = title_label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    Message {
        title: format!("Assignment {title_label}"),
        body: format!("{invigilator_name} has {label} the assignment for exam: {exam_title}"),
        kind: NotificationKind::Assignment,
    }
}

pub(crate) fn assignment_cancelled() -> Message {
    Message {
        title: CANCELLED_TITLE.to_string(),
        body: "Your exam assignment has been cancelled.".to_string(),
        kind: NotificationKind::Assignment,
    }
}

pub(crate) fn account_status(status: UserStatus) -> Message {
    Message {
        title: ACCOUNT_STATUS_TITLE.to_string(),
        body: format!("Your account status has been updated to {}.", status.as_str()),
        kind: NotificationKind::StatusChange,
    }
}

pub(crate) async fn deliver(
    executor: impl PgExecutor<'_>,
    user_id: &str,
    message: &Message,
    related_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    repositories::notifications::insert(
        executor,
        CreateNotification {
            user_id,
            title: &message.title,
            message: &message.body,
            kind: message.kind,
            related_id,
            now: primitive_now_utc(),
        },
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_message_names_invigilator_status_and_exam() {
        let message =
            assignment_response("Jane Doe", AssignmentStatus::Accepted, "Organic Chemistry");
        assert_eq!(message.title, "Assignment Accepted");
        assert_eq!(message.body, "Jane Doe has accepted the assignment for exam: Organic Chemistry");

        let message = assignment_response("Jane Doe", AssignmentStatus::Rejected, "Physics");
        assert_eq!(message.title, "Assignment Rejected");
    }

    #[test]
    fn account_status_uses_status_change_kind() {
        let message = account_status(UserStatus::Approved);
        assert_eq!(message.kind, NotificationKind::StatusChange);
        assert_eq!(message.body, "Your account status has been updated to approved.");
    }
}
