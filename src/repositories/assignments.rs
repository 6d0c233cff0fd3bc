use serde::Deserialize;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use time::{Date, PrimitiveDateTime, Time};

use crate::db::models::Assignment;
use crate::db::types::{AssignmentStatus, ExamStatus};
use crate::repositories::users::escape_like;
use crate::repositories::SortOrder;

pub(crate) const COLUMNS: &str = "\
    id, invigilator_id, exam_id, classroom_id, assigned_by, status, notes, \
    response_note, response_time, created_at, updated_at";

const DETAIL_FIELDS: &str = "\
    a.id, a.invigilator_id, a.exam_id, a.classroom_id, a.assigned_by, a.status,
           a.notes, a.response_note, a.response_time, a.created_at, a.updated_at,
           iu.full_name AS invigilator_name,
           iu.username AS invigilator_username,
           iu.email AS invigilator_email,
           iu.department AS invigilator_department,
           e.title AS exam_title,
           e.exam_date,
           e.start_time AS exam_start_time,
           e.end_time AS exam_end_time,
           e.status AS exam_status,
           c.name AS classroom_name,
           c.room_number AS classroom_room_number,
           c.building AS classroom_building,
           ab.full_name AS assigned_by_name";

const DETAIL_JOINS: &str = "\
    FROM assignments a
    JOIN users iu ON iu.id = a.invigilator_id
    JOIN exams e ON e.id = a.exam_id
    JOIN classrooms c ON c.id = a.classroom_id
    JOIN users ab ON ab.id = a.assigned_by";

/// An assignment with its invigilator, exam, classroom and assigner joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AssignmentDetailRow {
    #[sqlx(flatten)]
    pub(crate) assignment: Assignment,
    pub(crate) invigilator_name: String,
    pub(crate) invigilator_username: String,
    pub(crate) invigilator_email: String,
    pub(crate) invigilator_department: Option<String>,
    pub(crate) exam_title: String,
    pub(crate) exam_date: Date,
    pub(crate) exam_start_time: Time,
    pub(crate) exam_end_time: Time,
    pub(crate) exam_status: ExamStatus,
    pub(crate) classroom_name: String,
    pub(crate) classroom_room_number: String,
    pub(crate) classroom_building: String,
    pub(crate) assigned_by_name: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AssignmentListRow {
    #[sqlx(flatten)]
    pub(crate) detail: AssignmentDetailRow,
    pub(crate) total_count: i64,
}

pub(crate) struct CreateAssignment<'a> {
    pub id: &'a str,
    pub invigilator_id: &'a str,
    pub exam_id: &'a str,
    pub classroom_id: &'a str,
    pub assigned_by: &'a str,
    pub notes: Option<&'a str>,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn insert(
    executor: impl PgExecutor<'_>,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, invigilator_id, exam_id, classroom_id, assigned_by, status, notes,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.invigilator_id)
    .bind(params.exam_id)
    .bind(params.classroom_id)
    .bind(params.assigned_by)
    .bind(AssignmentStatus::Pending)
    .bind(params.notes)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
pub(crate) async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Locks the row until the surrounding transaction ends.
pub(crate) async fn find_for_update(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_detail(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<AssignmentDetailRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentDetailRow>(&format!(
        "SELECT {DETAIL_FIELDS} {DETAIL_JOINS} WHERE a.id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn record_response(
    executor: impl PgExecutor<'_>,
    id: &str,
    status: AssignmentStatus,
    response_note: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments
         SET status = $1, response_note = $2, response_time = $3, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(response_note)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_status(
    executor: impl PgExecutor<'_>,
    id: &str,
    status: AssignmentStatus,
    now: PrimitiveDateTime,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM assignments WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected())
}

pub(crate) async fn count_for_exam(
    executor: impl PgExecutor<'_>,
    exam_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn count_for_classroom(
    executor: impl PgExecutor<'_>,
    classroom_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE classroom_id = $1")
        .bind(classroom_id)
        .fetch_one(executor)
        .await
}

/// Completes accepted assignments whose exam has ended. Returns the ids touched.
pub(crate) async fn complete_finished(
    executor: impl PgExecutor<'_>,
    today: Date,
    now_time: Time,
    now: PrimitiveDateTime,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "UPDATE assignments a SET status = 'completed', updated_at = $3
         FROM exams e
         WHERE e.id = a.exam_id
           AND a.status = 'accepted'
           AND (e.exam_date < $1 OR (e.exam_date = $1 AND e.end_time <= $2))
         RETURNING a.id",
    )
    .bind(today)
    .bind(now_time)
    .bind(now)
    .fetch_all(executor)
    .await
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AssignmentSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Status,
    ExamDate,
}

impl AssignmentSort {
    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "a.created_at",
            Self::UpdatedAt => "a.updated_at",
            Self::Status => "a.status",
            Self::ExamDate => "e.exam_date",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AssignmentFilter {
    pub statuses: Vec<AssignmentStatus>,
    pub exam_id: Option<String>,
    pub invigilator_id: Option<String>,
    pub search: Option<String>,
    /// Only assignments whose exam falls on or after this date.
    pub exam_date_from: Option<Date>,
    pub sort: AssignmentSort,
    pub order: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &AssignmentFilter,
) -> Result<Vec<AssignmentListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {DETAIL_FIELDS}, COUNT(*) OVER() AS total_count {DETAIL_JOINS} WHERE TRUE"
    ));
    push_filters(&mut builder, filter);

    let direction = filter.order.as_sql();
    builder.push(format!(" ORDER BY {} {direction}", filter.sort.column()));
    if filter.sort == AssignmentSort::ExamDate {
        builder.push(format!(", e.start_time {direction}"));
    }
    builder
        .push(", a.id ASC OFFSET ")
        .push_bind(filter.offset)
        .push(" LIMIT ")
        .push_bind(filter.limit);

    builder.build_query_as::<AssignmentListRow>().fetch_all(pool).await
}

/// Total rows matching the filter, ignoring offset and limit.
pub(crate) async fn count(pool: &PgPool, filter: &AssignmentFilter) -> Result<i64, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) {DETAIL_JOINS} WHERE TRUE"));
    push_filters(&mut builder, filter);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &AssignmentFilter) {
    if !filter.statuses.is_empty() {
        builder.push(" AND a.status IN (");
        let mut separated = builder.separated(", ");
        for status in &filter.statuses {
            separated.push_bind(*status);
        }
        separated.push_unseparated(")");
    }
    if let Some(exam_id) = filter.exam_id.as_deref() {
        builder.push(" AND a.exam_id = ").push_bind(exam_id.to_string());
    }
    if let Some(invigilator_id) = filter.invigilator_id.as_deref() {
        builder.push(" AND a.invigilator_id = ").push_bind(invigilator_id.to_string());
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (iu.full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR iu.username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR iu.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.title ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filter.exam_date_from {
        builder.push(" AND e.exam_date >= ").push_bind(from);
    }
}
