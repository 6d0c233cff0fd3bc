use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{ExamResponse, ExamStatusUpdate, ExamUpdate};
use crate::services::audit::{self, AuditEntry};

use super::super::helpers;

pub(in crate::api::exams) async fn get_exam(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    Ok(Json(helpers::exam_to_response(&state, exam).await?))
}

pub(in crate::api::exams) async fn update_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    validate_payload(&payload)?;
    let exam = helpers::fetch_exam(&state, &exam_id).await?;

    let window_changed = payload.start_time.is_some() || payload.end_time.is_some();
    let effective_start = payload.start_time.unwrap_or(exam.start_time);
    let effective_end = payload.end_time.unwrap_or(exam.end_time);
    let duration_minutes = if window_changed || payload.duration_minutes.is_some() {
        Some(helpers::resolve_duration(effective_start, effective_end, payload.duration_minutes)?)
    } else {
        None
    };

    if let Some(links) = payload.classrooms.as_deref() {
        helpers::ensure_distinct_classrooms(links)?;
    }

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::exams::update(
        &mut *tx,
        &exam.id,
        repositories::exams::UpdateExam {
            title: non_blank(payload.title.as_deref()).map(str::to_string),
            description: non_blank(payload.description.as_deref()).map(str::to_string),
            exam_date: payload.exam_date,
            start_time: payload.start_time,
            end_time: payload.end_time,
            duration_minutes,
            status: payload.status,
        },
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    if let Some(links) = payload.classrooms.as_deref() {
        repositories::exam_classrooms::delete_for_exam(&mut *tx, &updated.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to clear exam classrooms"))?;
        helpers::link_classrooms(&mut tx, &updated.id, links, now).await?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exam update"))?;

    tracing::info!(exam_id = %updated.id, action = "update_exam", "Exam updated");

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "update_exam",
            resource_type: "exam",
            resource_id: Some(&updated.id),
            details: serde_json::json!({
                "classrooms_replaced": payload.classrooms.is_some(),
                "status": updated.status.as_str(),
            }),
        },
    )
    .await;

    Ok(Json(helpers::exam_to_response(&state, updated).await?))
}

pub(in crate::api::exams) async fn update_exam_status(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    Json(payload): Json<ExamStatusUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    let updated = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam { status: Some(payload.status), ..Default::default() },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam status"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    tracing::info!(
        exam_id = %updated.id,
        status = updated.status.as_str(),
        action = "update_exam_status",
        "Exam status updated"
    );

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "update_exam_status",
            resource_type: "exam",
            resource_id: Some(&updated.id),
            details: serde_json::json!({ "status": updated.status.as_str() }),
        },
    )
    .await;

    Ok(Json(helpers::exam_to_response(&state, updated).await?))
}

pub(in crate::api::exams) async fn delete_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;

    let assignments = repositories::assignments::count_for_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exam assignments"))?;
    if assignments > 0 {
        return Err(ApiError::Conflict(format!(
            "Exam has {assignments} assignment(s); delete them first"
        )));
    }

    repositories::exams::delete_by_id(state.db(), &exam.id).await.map_err(|e| {
        if repositories::is_foreign_key_violation(&e) {
            ApiError::Conflict("Exam is still referenced by assignments".to_string())
        } else {
            ApiError::internal(e, "Failed to delete exam")
        }
    })?;

    tracing::info!(exam_id = %exam.id, action = "delete_exam", "Exam deleted");

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "delete_exam",
            resource_type: "exam",
            resource_id: Some(&exam.id),
            details: serde_json::json!({ "title": exam.title }),
        },
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
