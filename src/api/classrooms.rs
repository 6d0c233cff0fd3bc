use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{resolve_total, PageParams, PaginatedResponse};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Classroom;
use crate::db::types::ClassroomStatus;
use crate::repositories;
use crate::schemas::classroom::{ClassroomInput, ClassroomResponse};
use crate::services::audit::{self, AuditEntry};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassroomListQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<ClassroomStatus>,
    #[serde(default)]
    building: Option<String>,
    #[serde(default)]
    block: Option<String>,
    #[serde(default, alias = "minCapacity")]
    min_capacity: Option<i32>,
    #[serde(default, alias = "maxCapacity")]
    max_capacity: Option<i32>,
    #[serde(default, alias = "hasProjector")]
    has_projector: Option<bool>,
    #[serde(default, alias = "hasComputer")]
    has_computer: Option<bool>,
    #[serde(default, alias = "hasWhiteboard")]
    has_whiteboard: Option<bool>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classrooms).post(create_classroom))
        .route(
            "/:classroom_id",
            get(get_classroom).put(replace_classroom).delete(delete_classroom),
        )
}

async fn list_classrooms(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ClassroomListQuery>,
) -> Result<Json<PaginatedResponse<ClassroomResponse>>, ApiError> {
    let page = PageParams::from_query(params.page, params.limit);

    let list_params = repositories::classrooms::ListClassroomsParams {
        search: non_blank(params.search.as_deref()),
        status: params.status,
        building: non_blank(params.building.as_deref()),
        block: non_blank(params.block.as_deref()),
        min_capacity: params.min_capacity,
        max_capacity: params.max_capacity,
        has_projector: params.has_projector,
        has_computer: params.has_computer,
        has_whiteboard: params.has_whiteboard,
        offset: page.offset(),
        limit: page.limit,
    };
    let rows = repositories::classrooms::list(state.db(), list_params)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classrooms"))?;

    let total_count = resolve_total(rows.first().map(|row| row.total_count), page, || {
        repositories::classrooms::count(state.db(), list_params)
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count classrooms"))?;
    let items = rows.into_iter().map(|row| ClassroomResponse::from_db(row.classroom)).collect();

    Ok(Json(PaginatedResponse::new(items, total_count, page)))
}

async fn get_classroom(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let classroom = fetch_classroom(&state, &classroom_id).await?;
    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn create_classroom(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ClassroomInput>,
) -> Result<(StatusCode, Json<ClassroomResponse>), ApiError> {
    validate_payload(&payload)?;
    let fields = payload.fields();
    ensure_room_number_free(&state, fields.room_number, None).await?;

    let classroom = repositories::classrooms::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        fields,
        primitive_now_utc(),
    )
    .await
    .map_err(map_write_error)?;

    tracing::info!(
        classroom_id = %classroom.id,
        room_number = %classroom.room_number,
        action = "create_classroom",
        "Classroom created"
    );
    record(&state, &admin.id, "create_classroom", &classroom).await;

    Ok((StatusCode::CREATED, Json(ClassroomResponse::from_db(classroom))))
}

async fn replace_classroom(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
    Json(payload): Json<ClassroomInput>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    validate_payload(&payload)?;
    let fields = payload.fields();
    ensure_room_number_free(&state, fields.room_number, Some(&classroom_id)).await?;

    let classroom =
        repositories::classrooms::replace(state.db(), &classroom_id, fields, primitive_now_utc())
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;

    tracing::info!(classroom_id = %classroom.id, action = "update_classroom", "Classroom updated");
    record(&state, &admin.id, "update_classroom", &classroom).await;

    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn delete_classroom(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let classroom = fetch_classroom(&state, &classroom_id).await?;

    let assignments = repositories::assignments::count_for_classroom(state.db(), &classroom.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count classroom assignments"))?;
    if assignments > 0 {
        return Err(ApiError::Conflict(format!(
            "Classroom has {assignments} assignment(s); delete them first"
        )));
    }

    repositories::classrooms::delete_by_id(state.db(), &classroom.id).await.map_err(|e| {
        if repositories::is_foreign_key_violation(&e) {
            ApiError::Conflict("Classroom is still referenced by assignments".to_string())
        } else {
            ApiError::internal(e, "Failed to delete classroom")
        }
    })?;

    tracing::info!(classroom_id = %classroom.id, action = "delete_classroom", "Classroom deleted");
    record(&state, &admin.id, "delete_classroom", &classroom).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_classroom(state: &AppState, classroom_id: &str) -> Result<Classroom, ApiError> {
    repositories::classrooms::find_by_id(state.db(), classroom_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch classroom"))?
        .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))
}

async fn ensure_room_number_free(
    state: &AppState,
    room_number: &str,
    exclude_id: Option<&str>,
) -> Result<(), ApiError> {
    let taken = repositories::classrooms::room_number_taken(state.db(), room_number, exclude_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check room number"))?;
    if taken {
        return Err(ApiError::Conflict(format!("Room number {room_number} already exists")));
    }
    Ok(())
}

fn map_write_error(err: sqlx::Error) -> ApiError {
    if repositories::is_unique_violation(&err) {
        ApiError::Conflict("Room number already exists".to_string())
    } else {
        ApiError::internal(err, "Failed to save classroom")
    }
}

async fn record(state: &AppState, actor_id: &str, action: &str, classroom: &Classroom) {
    audit::record(
        state.db(),
        AuditEntry {
            actor_id,
            action,
            resource_type: "classroom",
            resource_id: Some(&classroom.id),
            details: serde_json::json!({
                "room_number": classroom.room_number,
                "building": classroom.building,
            }),
        },
    )
    .await;
}
