use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{resolve_total, PageParams, PaginatedResponse};
use crate::api::validation::non_blank;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::ExamSummaryResponse;

use super::super::queries::ListExamsQuery;

pub(in crate::api::exams) async fn list_exams(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListExamsQuery>,
) -> Result<Json<PaginatedResponse<ExamSummaryResponse>>, ApiError> {
    let page = PageParams::from_query(params.page, params.limit);

    let list_params = repositories::exams::ListExamsParams {
        status: params.status,
        exam_date: params.date,
        search: non_blank(params.search.as_deref()),
        sort: params.sort_by,
        order: params.sort_order,
        offset: page.offset(),
        limit: page.limit,
    };
    let rows = repositories::exams::list(state.db(), list_params)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let total_count = resolve_total(rows.first().map(|row| row.total_count), page, || {
        repositories::exams::count(state.db(), list_params)
    })
    .await
    .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let items = rows.into_iter().map(ExamSummaryResponse::from).collect();

    Ok(Json(PaginatedResponse::new(items, total_count, page)))
}
