use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::{format_date, primitive_now_utc};
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse};
use crate::services::audit::{self, AuditEntry};

use super::super::helpers;

pub(in crate::api::exams) async fn create_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    validate_payload(&payload)?;
    let duration_minutes =
        helpers::resolve_duration(payload.start_time, payload.end_time, payload.duration_minutes)?;
    helpers::ensure_distinct_classrooms(&payload.classrooms)?;

    let now = primitive_now_utc();
    let exam_id = Uuid::new_v4().to_string();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let exam = repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            id: &exam_id,
            title: payload.title.trim(),
            description: non_blank(payload.description.as_deref()),
            exam_date: payload.exam_date,
            start_time: payload.start_time,
            end_time: payload.end_time,
            duration_minutes,
            created_by: &admin.id,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    helpers::link_classrooms(&mut tx, &exam.id, &payload.classrooms, now).await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exam"))?;

    tracing::info!(
        exam_id = %exam.id,
        exam_date = %format_date(exam.exam_date),
        classrooms = payload.classrooms.len(),
        action = "create_exam",
        "Exam created"
    );

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "create_exam",
            resource_type: "exam",
            resource_id: Some(&exam.id),
            details: serde_json::json!({
                "title": exam.title,
                "exam_date": format_date(exam.exam_date),
                "classrooms": payload.classrooms.len(),
            }),
        },
    )
    .await;

    let response = helpers::exam_to_response(&state, exam).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
