mod handlers;
mod helpers;
mod queries;

use axum::{routing::get, routing::patch, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_exams).post(handlers::create_exam))
        .route(
            "/:exam_id",
            get(handlers::get_exam).patch(handlers::update_exam).delete(handlers::delete_exam),
        )
        .route("/:exam_id/status", patch(handlers::update_exam_status))
}

#[cfg(test)]
mod tests;
