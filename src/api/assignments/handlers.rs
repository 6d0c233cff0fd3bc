use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentInvigilator, CurrentUser};
use crate::api::pagination::{resolve_total, PageParams, PaginatedResponse};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::today_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::assignments::AssignmentFilter;
use crate::schemas::assignment::{AssignmentCreate, AssignmentResponse, AssignmentStatusUpdate};
use crate::services::assignments::{self, NewAssignment};
use crate::services::audit::{self, AuditEntry};

use super::queries::ListAssignmentsQuery;

pub(super) async fn create_assignment(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    validate_payload(&payload)?;

    let detail = assignments::create(
        state.db(),
        &admin.id,
        NewAssignment {
            invigilator_id: payload.invigilator_id.trim(),
            exam_id: payload.exam_id.trim(),
            classroom_id: payload.classroom_id.trim(),
            notes: non_blank(payload.notes.as_deref()),
        },
    )
    .await?;

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "create_assignment",
            resource_type: "assignment",
            resource_id: Some(&detail.assignment.id),
            details: serde_json::json!({
                "invigilator_id": detail.assignment.invigilator_id,
                "exam_id": detail.assignment.exam_id,
                "classroom_id": detail.assignment.classroom_id,
            }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_detail(detail))))
}

pub(super) async fn list_assignments(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListAssignmentsQuery>,
) -> Result<Json<PaginatedResponse<AssignmentResponse>>, ApiError> {
    let exam_date_from = if params.include_past { None } else { Some(today_utc()) };
    let filter = AssignmentFilter {
        exam_id: non_blank(params.exam_id.as_deref()).map(str::to_string),
        invigilator_id: non_blank(params.invigilator_id.as_deref()).map(str::to_string),
        exam_date_from,
        ..base_filter(&params)?
    };

    list_page(&state, filter, &params).await
}

pub(super) async fn list_my_assignments(
    CurrentInvigilator(user): CurrentInvigilator,
    State(state): State<AppState>,
    Query(params): Query<ListAssignmentsQuery>,
) -> Result<Json<PaginatedResponse<AssignmentResponse>>, ApiError> {
    let filter = AssignmentFilter {
        exam_id: non_blank(params.exam_id.as_deref()).map(str::to_string),
        invigilator_id: Some(user.id),
        ..base_filter(&params)?
    };

    list_page(&state, filter, &params).await
}

pub(super) async fn get_assignment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let detail = repositories::assignments::find_detail(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    if user.role != UserRole::Admin && detail.assignment.invigilator_id != user.id {
        return Err(ApiError::Forbidden("Not authorized to view this assignment"));
    }

    Ok(Json(AssignmentResponse::from_detail(detail)))
}

pub(super) async fn update_assignment_status(
    CurrentInvigilator(user): CurrentInvigilator,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
    Json(payload): Json<AssignmentStatusUpdate>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    validate_payload(&payload)?;

    let detail = assignments::respond(
        state.db(),
        &assignment_id,
        &user,
        payload.status,
        non_blank(payload.response_note.as_deref()),
    )
    .await?;

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &user.id,
            action: "update_assignment_status",
            resource_type: "assignment",
            resource_id: Some(&detail.assignment.id),
            details: serde_json::json!({ "status": detail.assignment.status.as_str() }),
        },
    )
    .await;

    Ok(Json(AssignmentResponse::from_detail(detail)))
}

pub(super) async fn complete_assignment(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let detail = assignments::complete(state.db(), &assignment_id).await?;

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "complete_assignment",
            resource_type: "assignment",
            resource_id: Some(&detail.assignment.id),
            details: serde_json::json!({}),
        },
    )
    .await;

    Ok(Json(AssignmentResponse::from_detail(detail)))
}

pub(super) async fn delete_assignment(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    assignments::delete(state.db(), &assignment_id).await?;

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "delete_assignment",
            resource_type: "assignment",
            resource_id: Some(&assignment_id),
            details: serde_json::json!({}),
        },
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Status, search and ordering shared by the admin and invigilator listings.
fn base_filter(params: &ListAssignmentsQuery) -> Result<AssignmentFilter, ApiError> {
    let page = PageParams::from_query(params.page, params.limit);
    Ok(AssignmentFilter {
        statuses: params.statuses()?,
        search: non_blank(params.search.as_deref()).map(str::to_string),
        sort: params.sort_by,
        order: params.sort_order,
        offset: page.offset(),
        limit: page.limit,
        ..Default::default()
    })
}

async fn list_page(
    state: &AppState,
    filter: AssignmentFilter,
    params: &ListAssignmentsQuery,
) -> Result<Json<PaginatedResponse<AssignmentResponse>>, ApiError> {
    let page = PageParams::from_query(params.page, params.limit);
    let rows = repositories::assignments::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    let total_count = resolve_total(rows.first().map(|row| row.total_count), page, || {
        repositories::assignments::count(state.db(), &filter)
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count assignments"))?;
    let items = rows.into_iter().map(|row| AssignmentResponse::from_detail(row.detail)).collect();

    Ok(Json(PaginatedResponse::new(items, total_count, page)))
}
