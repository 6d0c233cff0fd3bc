use std::collections::HashSet;

use time::{PrimitiveDateTime, Time};

use crate::api::errors::ApiError;
use crate::api::validation::non_blank;
use crate::core::state::AppState;
use crate::core::time::minutes_between;
use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::exam::{ExamClassroomInput, ExamResponse};

/// Falls back to the length of the time window when no explicit duration is given.
pub(super) fn resolve_duration(
    start_time: Time,
    end_time: Time,
    explicit: Option<i32>,
) -> Result<i32, ApiError> {
    if end_time <= start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    match explicit {
        Some(minutes) => Ok(minutes),
        None => i32::try_from(minutes_between(start_time, end_time))
            .map_err(|_| ApiError::BadRequest("Exam window is too long".to_string())),
    }
}

pub(super) fn ensure_distinct_classrooms(links: &[ExamClassroomInput]) -> Result<(), ApiError> {
    let mut seen = HashSet::with_capacity(links.len());
    for link in links {
        if !seen.insert(link.classroom_id.trim()) {
            return Err(ApiError::BadRequest(format!(
                "Classroom {} is linked more than once",
                link.classroom_id.trim()
            )));
        }
    }
    Ok(())
}

pub(super) async fn link_classrooms(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    exam_id: &str,
    links: &[ExamClassroomInput],
    now: PrimitiveDateTime,
) -> Result<(), ApiError> {
    for link in links {
        repositories::exam_classrooms::insert(
            &mut **tx,
            exam_id,
            repositories::exam_classrooms::LinkClassroom {
                classroom_id: link.classroom_id.trim(),
                required_invigilators: link.required_invigilators,
                notes: non_blank(link.notes.as_deref()),
            },
            now,
        )
        .await
        .map_err(|e| {
            if repositories::is_foreign_key_violation(&e) {
                ApiError::BadRequest(format!("Classroom {} does not exist", link.classroom_id.trim()))
            } else {
                ApiError::internal(e, "Failed to link classroom")
            }
        })?;
    }
    Ok(())
}

pub(super) async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

/// Loads the linked classrooms and creator name that the detail view carries.
pub(super) async fn exam_to_response(state: &AppState, exam: Exam) -> Result<ExamResponse, ApiError> {
    let classrooms = repositories::exam_classrooms::list_for_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam classrooms"))?;

    let creator = repositories::users::find_by_id(state.db(), &exam.created_by)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam creator"))?;

    Ok(ExamResponse::from_db(exam, creator.map(|user| user.full_name), classrooms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::time;

    fn link(classroom_id: &str) -> ExamClassroomInput {
        ExamClassroomInput {
            classroom_id: classroom_id.to_string(),
            required_invigilators: 1,
            notes: None,
        }
    }

    #[test]
    fn duration_defaults_to_window_length() {
        assert_eq!(resolve_duration(time!(09:00), time!(11:30), None).unwrap(), 150);
        assert_eq!(resolve_duration(time!(09:00), time!(11:30), Some(120)).unwrap(), 120);
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert!(resolve_duration(time!(12:00), time!(09:00), None).is_err());
        assert!(resolve_duration(time!(09:00), time!(09:00), Some(10)).is_err());
    }

    #[test]
    fn duplicate_links_are_rejected() {
        assert!(ensure_distinct_classrooms(&[link("a"), link("b")]).is_ok());
        assert!(ensure_distinct_classrooms(&[link("a"), link(" a ")]).is_err());
    }
}
