use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::AssignmentStatus;
use crate::repositories;
use crate::repositories::assignments::{AssignmentDetailRow, CreateAssignment};
use crate::services::assignment_lifecycle::{self, InvalidTransition};
use crate::services::notifications;

#[derive(Debug, Error)]
pub(crate) enum AssignmentError {
    #[error("Assignment not found")]
    NotFound,
    #[error("Only the assigned invigilator can respond to this assignment")]
    NotAssignee,
    #[error("Cannot change assignment status from {from} to {to}")]
    InvalidTransition { from: AssignmentStatus, to: AssignmentStatus },
    #[error("Status must be accepted or rejected, got {0}")]
    InvalidResponse(AssignmentStatus),
    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<InvalidTransition> for AssignmentError {
    fn from(err: InvalidTransition) -> Self {
        Self::InvalidTransition { from: err.from, to: err.to }
    }
}

impl AssignmentError {
    fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return Self::MissingReference(match db_err.constraint() {
                    Some("assignments_invigilator_id_fkey") => "invigilator",
                    Some("assignments_exam_id_fkey") => "exam",
                    Some("assignments_classroom_id_fkey") => "classroom",
                    Some("assignments_assigned_by_fkey") => "assigner",
                    _ => "record",
                });
            }
        }
        Self::Database(err)
    }
}

pub(crate) struct NewAssignment<'a> {
    pub(crate) invigilator_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) classroom_id: &'a str,
    pub(crate) notes: Option<&'a str>,
}

/// Inserts a pending assignment and the invigilator's notification atomically.
pub(crate) async fn create(
    pool: &PgPool,
    assigned_by: &str,
    input: NewAssignment<'_>,
) -> Result<AssignmentDetailRow, AssignmentError> {
    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    repositories::assignments::insert(
        &mut *tx,
        CreateAssignment {
            id: &id,
            invigilator_id: input.invigilator_id,
            exam_id: input.exam_id,
            classroom_id: input.classroom_id,
            assigned_by,
            notes: input.notes,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(AssignmentError::from_insert)?;

    let detail = repositories::assignments::find_detail(&mut *tx, &id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    notifications::deliver(
        &mut *tx,
        input.invigilator_id,
        &notifications::new_assignment(&detail.exam_title),
        Some(&id),
    )
    .await?;

    tx.commit().await?;

    metrics::assignment_created();
    tracing::info!(
        assignment_id = %id,
        invigilator_id = %input.invigilator_id,
        exam_id = %input.exam_id,
        assigned_by = %assigned_by,
        action = "assignment_create",
        "Assignment created"
    );

    Ok(detail)
}

/// Records the invigilator's answer. The row stays locked until commit so
/// concurrent answers serialize and the later one fails the transition check.
pub(crate) async fn respond(
    pool: &PgPool,
    assignment_id: &str,
    responder: &User,
    status: AssignmentStatus,
    response_note: Option<&str>,
) -> Result<AssignmentDetailRow, AssignmentError> {
    if !assignment_lifecycle::is_response(status) {
        return Err(AssignmentError::InvalidResponse(status));
    }

    let mut tx = pool.begin().await?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    if assignment.invigilator_id != responder.id {
        return Err(AssignmentError::NotAssignee);
    }

    assignment_lifecycle::check(assignment.status, status)?;

    repositories::assignments::record_response(
        &mut *tx,
        assignment_id,
        status,
        response_note,
        primitive_now_utc(),
    )
    .await?;

    let detail = repositories::assignments::find_detail(&mut *tx, assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    notifications::deliver(
        &mut *tx,
        &assignment.assigned_by,
        &notifications::assignment_response(&responder.full_name, status, &detail.exam_title),
        Some(assignment_id),
    )
    .await?;

    tx.commit().await?;

    metrics::assignment_response(status.as_str());
    tracing::info!(
        assignment_id = %assignment_id,
        invigilator_id = %responder.id,
        status = status.as_str(),
        action = "assignment_respond",
        "Invigilator responded to assignment"
    );

    Ok(detail)
}

/// Applies `accepted -> completed` for a single assignment.
pub(crate) async fn complete(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<AssignmentDetailRow, AssignmentError> {
    let mut tx = pool.begin().await?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    let next = assignment_lifecycle::check(assignment.status, AssignmentStatus::Completed)?;
    repositories::assignments::set_status(&mut *tx, assignment_id, next, primitive_now_utc())
        .await?;

    let detail = repositories::assignments::find_detail(&mut *tx, assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    tx.commit().await?;

    metrics::assignments_completed(1);
    tracing::info!(
        assignment_id = %assignment_id,
        action = "assignment_complete",
        "Assignment completed"
    );

    Ok(detail)
}

/// Notifies the invigilator and hard-deletes the row in one transaction.
pub(crate) async fn delete(pool: &PgPool, assignment_id: &str) -> Result<(), AssignmentError> {
    let mut tx = pool.begin().await?;

    let assignment = repositories::assignments::find_for_update(&mut *tx, assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    notifications::deliver(
        &mut *tx,
        &assignment.invigilator_id,
        &notifications::assignment_cancelled(),
        Some(assignment_id),
    )
    .await?;

    repositories::assignments::delete_by_id(&mut *tx, assignment_id).await?;

    tx.commit().await?;

    tracing::info!(
        assignment_id = %assignment_id,
        invigilator_id = %assignment.invigilator_id,
        previous_status = assignment.status.as_str(),
        action = "assignment_delete",
        "Assignment deleted"
    );

    Ok(())
}
