use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{resolve_total, PageParams, PaginatedResponse};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::{UserRole, UserStatus};
use crate::repositories;
use crate::schemas::user::{AdminUserUpdate, ProfileUpdate, UserResponse, UserStatusUpdate};
use crate::services::audit::{self, AuditEntry};
use crate::services::notifications;

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    status: Option<UserStatus>,
    #[serde(default)]
    search: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", patch(update_me))
        .route("/:user_id", get(get_user).patch(update_user))
        .route("/:user_id/status", patch(update_user_status))
}

async fn list_users(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let page = PageParams::from_query(params.page, params.limit);

    let list_params = repositories::users::ListUsersParams {
        role: params.role,
        status: params.status,
        search: non_blank(params.search.as_deref()),
        offset: page.offset(),
        limit: page.limit,
    };
    let rows = repositories::users::list(state.db(), list_params)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    let total_count = resolve_total(rows.first().map(|row| row.total_count), page, || {
        repositories::users::count(state.db(), list_params)
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let items = rows.into_iter().map(|row| UserResponse::from_db(row.user)).collect();

    Ok(Json(PaginatedResponse::new(items, total_count, page)))
}

async fn get_user(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn update_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_payload(&payload)?;
    let existing = fetch_user(&state, &user_id).await?;

    let mut params = profile_changes(&state, &existing, &payload.profile).await?;
    params.is_active = payload.is_active;
    params.max_duties_per_day = payload.max_duties_per_day;
    params.max_duties_per_week = payload.max_duties_per_week;

    let updated = apply_update(&state, &user_id, params).await?;

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "update_user",
            resource_type: "user",
            resource_id: Some(&updated.id),
            details: serde_json::json!({
                "is_active": updated.is_active,
                "max_duties_per_day": updated.max_duties_per_day,
                "max_duties_per_week": updated.max_duties_per_week,
            }),
        },
    )
    .await;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn update_user_status(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserStatusUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::users::update(
        &mut *tx,
        &user_id,
        repositories::users::UpdateUser { status: Some(payload.status), ..Default::default() },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user status"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    notifications::deliver(
        &mut *tx,
        &updated.id,
        &notifications::account_status(payload.status),
        Some(&updated.id),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create notification"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit status update"))?;

    tracing::info!(
        user_id = %updated.id,
        status = updated.status.as_str(),
        action = "update_user_status",
        "User status updated"
    );

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &admin.id,
            action: "update_user_status",
            resource_type: "user",
            resource_id: Some(&updated.id),
            details: serde_json::json!({ "status": updated.status.as_str() }),
        },
    )
    .await;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_payload(&payload)?;

    let params = profile_changes(&state, &user, &payload).await?;
    let updated = apply_update(&state, &user.id, params).await?;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Maps a profile patch onto repository params, rejecting an email already held by someone else.
async fn profile_changes(
    state: &AppState,
    user: &User,
    payload: &ProfileUpdate,
) -> Result<repositories::users::UpdateUser, ApiError> {
    let email = non_blank(payload.email.as_deref()).map(str::to_ascii_lowercase);

    if let Some(email) = email.as_deref() {
        let conflict =
            repositories::users::find_conflicting(state.db(), &user.username, email, Some(&user.id))
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check email"))?;
        if conflict.is_some() {
            return Err(ApiError::Conflict("Email is already in use".to_string()));
        }
    }

    Ok(repositories::users::UpdateUser {
        full_name: non_blank(payload.full_name.as_deref()).map(str::to_string),
        email,
        gender: payload.gender,
        phone_number: non_blank(payload.phone_number.as_deref()).map(str::to_string),
        department: non_blank(payload.department.as_deref()).map(str::to_string),
        designation: non_blank(payload.designation.as_deref()).map(str::to_string),
        ..Default::default()
    })
}

async fn apply_update(
    state: &AppState,
    user_id: &str,
    params: repositories::users::UpdateUser,
) -> Result<User, ApiError> {
    repositories::users::update(state.db(), user_id, params, primitive_now_utc())
        .await
        .map_err(|e| {
            if repositories::is_unique_violation(&e) {
                ApiError::Conflict("Email is already in use".to_string())
            } else {
                ApiError::internal(e, "Failed to update user")
            }
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests;
