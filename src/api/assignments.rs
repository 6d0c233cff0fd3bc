mod handlers;
mod queries;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_assignments).post(handlers::create_assignment))
        .route("/my-assignments", get(handlers::list_my_assignments))
        .route(
            "/:assignment_id",
            get(handlers::get_assignment).delete(handlers::delete_assignment),
        )
        .route("/:assignment_id/status", patch(handlers::update_assignment_status))
        .route("/:assignment_id/complete", patch(handlers::complete_assignment))
}
