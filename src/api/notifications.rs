use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{resolve_total, PageParams, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::notification::{
    MarkAllReadResponse, NotificationListResponse, NotificationResponse,
};

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationListQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default, alias = "isRead")]
    is_read: Option<bool>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/mark-all-read", patch(mark_all_read))
        .route("/:notification_id/read", patch(mark_read))
        .route("/:notification_id", delete(delete_notification))
}

async fn list_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let page = PageParams::from_query(params.page, params.limit);

    let rows = repositories::notifications::list_for_user(
        state.db(),
        &user.id,
        params.is_read,
        page.offset(),
        page.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;

    let unread_count = repositories::notifications::count_unread(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unread notifications"))?;

    let total_count = resolve_total(rows.first().map(|row| row.total_count), page, || {
        repositories::notifications::count_for_user(state.db(), &user.id, params.is_read)
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count notifications"))?;
    let items =
        rows.into_iter().map(|row| NotificationResponse::from_db(row.notification)).collect();

    Ok(Json(NotificationListResponse {
        page: PaginatedResponse::new(items, total_count, page),
        unread_count,
    }))
}

async fn mark_read(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification = repositories::notifications::mark_read(
        state.db(),
        &notification_id,
        &user.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to mark notification as read"))?
    .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(NotificationResponse::from_db(notification)))
}

async fn mark_all_read(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated =
        repositories::notifications::mark_all_read(state.db(), &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to mark notifications as read"))?;

    tracing::debug!(user_id = %user.id, updated, "Marked notifications as read");

    Ok(Json(MarkAllReadResponse { updated }))
}

async fn delete_notification(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted =
        repositories::notifications::delete_for_user(state.db(), &notification_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete notification"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
