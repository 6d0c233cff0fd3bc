use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentInvigilator};
use crate::core::state::AppState;
use crate::core::time::today_utc;
use crate::repositories;
use crate::schemas::stats::{
    fill_months, InvigilatorStatsResponse, MonthlyExamCount, SystemStatsResponse,
};

#[derive(Debug, Deserialize)]
pub(crate) struct MonthlyExamsQuery {
    #[serde(default)]
    year: Option<i32>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/system", get(system_stats))
        .route("/invigilator", get(invigilator_stats))
        .route("/monthly-exams", get(monthly_exams))
}

async fn system_stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let counts = repositories::stats::system_counts(state.db(), today_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load system statistics"))?;

    Ok(Json(SystemStatsResponse {
        total_users: counts.total_users,
        pending_users: counts.pending_users,
        total_invigilators: counts.total_invigilators,
        total_exams: counts.total_exams,
        upcoming_exams: counts.upcoming_exams,
        total_classrooms: counts.total_classrooms,
        total_assignments: counts.total_assignments,
        pending_assignments: counts.pending_assignments,
        accepted_assignments: counts.accepted_assignments,
        rejected_assignments: counts.rejected_assignments,
        completed_assignments: counts.completed_assignments,
    }))
}

async fn invigilator_stats(
    CurrentInvigilator(user): CurrentInvigilator,
    State(state): State<AppState>,
) -> Result<Json<InvigilatorStatsResponse>, ApiError> {
    let counts = repositories::stats::invigilator_counts(state.db(), &user.id, today_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load invigilator statistics"))?;

    Ok(Json(InvigilatorStatsResponse {
        total_assignments: counts.total,
        pending_assignments: counts.pending,
        accepted_assignments: counts.accepted,
        rejected_assignments: counts.rejected,
        completed_assignments: counts.completed,
        upcoming_assignments: counts.upcoming,
    }))
}

async fn monthly_exams(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<MonthlyExamsQuery>,
) -> Result<Json<Vec<MonthlyExamCount>>, ApiError> {
    let year = params.year.unwrap_or_else(|| today_utc().year());
    if !(1900..=9999).contains(&year) {
        return Err(ApiError::BadRequest("year is out of range".to_string()));
    }

    let rows = repositories::exams::count_by_month(state.db(), year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load monthly exam counts"))?;

    Ok(Json(fill_months(&rows)))
}
