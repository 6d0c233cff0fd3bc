use serde::Deserialize;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use time::{Date, PrimitiveDateTime, Time};

use crate::db::models::Exam;
use crate::db::types::ExamStatus;
use crate::repositories::users::escape_like;
use crate::repositories::SortOrder;

pub(crate) const COLUMNS: &str = "\
    id, title, description, exam_date, start_time, end_time, duration_minutes, \
    status, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) struct CreateExam<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub exam_date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub duration_minutes: i32,
    pub created_by: &'a str,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, exam_date, start_time, end_time,
            duration_minutes, status, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.exam_date)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.duration_minutes)
    .bind(ExamStatus::Scheduled)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

#[derive(Default)]
pub(crate) struct UpdateExam {
    pub title: Option<String>,
    pub description: Option<String>,
    pub exam_date: Option<Date>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ExamStatus>,
}

pub(crate) async fn update(
    executor: impl PgExecutor<'_>,
    id: &str,
    params: UpdateExam,
    now: PrimitiveDateTime,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            exam_date = COALESCE($3, exam_date),
            start_time = COALESCE($4, start_time),
            end_time = COALESCE($5, end_time),
            duration_minutes = COALESCE($6, duration_minutes),
            status = COALESCE($7, status),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.exam_date)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.duration_minutes)
    .bind(params.status)
    .bind(now)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ExamSort {
    #[default]
    ExamDate,
    CreatedAt,
    Title,
}

impl ExamSort {
    fn column(self) -> &'static str {
        match self {
            Self::ExamDate => "exam_date",
            Self::CreatedAt => "created_at",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamListRow {
    #[sqlx(flatten)]
    pub(crate) exam: Exam,
    pub(crate) classroom_count: i64,
    pub(crate) assignment_count: i64,
    pub(crate) total_count: i64,
}

#[derive(Clone, Copy)]
pub(crate) struct ListExamsParams<'a> {
    pub status: Option<ExamStatus>,
    pub exam_date: Option<Date>,
    pub search: Option<&'a str>,
    pub sort: ExamSort,
    pub order: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    params: ListExamsParams<'_>,
) -> Result<Vec<ExamListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS},
                (SELECT COUNT(*) FROM exam_classrooms ec WHERE ec.exam_id = exams.id) AS classroom_count,
                (SELECT COUNT(*) FROM assignments a WHERE a.exam_id = exams.id) AS assignment_count,
                COUNT(*) OVER() AS total_count
         FROM exams WHERE TRUE"
    ));
    push_filters(&mut builder, params);

    let direction = params.order.as_sql();
    builder.push(format!(" ORDER BY {} {direction}", params.sort.column()));
    if params.sort == ExamSort::ExamDate {
        builder.push(format!(", start_time {direction}"));
    }
    builder
        .push(", id ASC OFFSET ")
        .push_bind(params.offset)
        .push(" LIMIT ")
        .push_bind(params.limit);

    builder.build_query_as::<ExamListRow>().fetch_all(pool).await
}

/// Total rows matching the filters, ignoring offset and limit.
pub(crate) async fn count(pool: &PgPool, params: ListExamsParams<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams WHERE TRUE");
    push_filters(&mut builder, params);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: ListExamsParams<'_>) {
    if let Some(status) = params.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(exam_date) = params.exam_date {
        builder.push(" AND exam_date = ").push_bind(exam_date);
    }
    if let Some(search) = params.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(description, '') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Marks scheduled or ongoing exams whose end has passed as completed.
pub(crate) async fn complete_finished(
    executor: impl PgExecutor<'_>,
    today: Date,
    now_time: Time,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exams SET status = 'completed', updated_at = $3
         WHERE status IN ('scheduled', 'ongoing')
           AND (exam_date < $1 OR (exam_date = $1 AND end_time <= $2))",
    )
    .bind(today)
    .bind(now_time)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Marks scheduled exams that are currently running as ongoing.
pub(crate) async fn start_running(
    executor: impl PgExecutor<'_>,
    today: Date,
    now_time: Time,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exams SET status = 'ongoing', updated_at = $3
         WHERE status = 'scheduled'
           AND exam_date = $1 AND start_time <= $2 AND end_time > $2",
    )
    .bind(today)
    .bind(now_time)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn count_by_month(
    executor: impl PgExecutor<'_>,
    year: i32,
) -> Result<Vec<(i32, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (i32, i64)>(
        "SELECT EXTRACT(MONTH FROM exam_date)::int AS month, COUNT(*)
         FROM exams
         WHERE EXTRACT(YEAR FROM exam_date)::int = $1
         GROUP BY month
         ORDER BY month",
    )
    .bind(year)
    .fetch_all(executor)
    .await
}
