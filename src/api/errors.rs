use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::assignments::AssignmentError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::NotFound => Self::NotFound(err.to_string()),
            AssignmentError::NotAssignee => {
                Self::Forbidden("Only the assigned invigilator can respond to this assignment")
            }
            AssignmentError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            AssignmentError::InvalidResponse(_) | AssignmentError::MissingReference(_) => {
                Self::BadRequest(err.to_string())
            }
            AssignmentError::Database(db_err) => {
                Self::internal(db_err, "Assignment database operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::TooManyRequests(message) => message.to_string(),
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), message })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::AssignmentStatus;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_sets_www_authenticate() {
        let response = ApiError::Unauthorized("Invalid authentication credentials").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let json = body_json(response).await;
        assert_eq!(json["status"], 401);
        assert_eq!(json["message"], "Invalid authentication credentials");
    }

    #[tokio::test]
    async fn assignment_errors_map_to_http_statuses() {
        let cases = [
            (AssignmentError::NotFound, StatusCode::NOT_FOUND),
            (AssignmentError::NotAssignee, StatusCode::FORBIDDEN),
            (
                AssignmentError::InvalidTransition {
                    from: AssignmentStatus::Accepted,
                    to: AssignmentStatus::Rejected,
                },
                StatusCode::CONFLICT,
            ),
            (AssignmentError::InvalidResponse(AssignmentStatus::Completed), StatusCode::BAD_REQUEST),
            (AssignmentError::MissingReference("exam"), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn missing_reference_names_the_reference() {
        let response = ApiError::from(AssignmentError::MissingReference("invigilator")).into_response();
        let json = body_json(response).await;
        assert_eq!(json["message"], "Referenced invigilator does not exist");
    }
}
