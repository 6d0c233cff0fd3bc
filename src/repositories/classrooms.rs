use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Classroom;
use crate::db::types::ClassroomStatus;
use crate::repositories::users::escape_like;

pub(crate) const COLUMNS: &str = "\
    id, name, room_number, building, block, floor, capacity, has_projector, \
    has_computer, has_whiteboard, status, department_name, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<Classroom>, sqlx::Error> {
    sqlx::query_as::<_, Classroom>(&format!("SELECT {COLUMNS} FROM classrooms WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn room_number_taken(
    executor: impl PgExecutor<'_>,
    room_number: &str,
    exclude_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM classrooms
            WHERE room_number = $1 AND ($2::text IS NULL OR id <> $2)
        )",
    )
    .bind(room_number)
    .bind(exclude_id)
    .fetch_one(executor)
    .await
}

pub(crate) struct ClassroomFields<'a> {
    pub name: &'a str,
    pub room_number: &'a str,
    pub building: &'a str,
    pub block: Option<&'a str>,
    pub floor: i32,
    pub capacity: i32,
    pub has_projector: bool,
    pub has_computer: bool,
    pub has_whiteboard: bool,
    pub status: ClassroomStatus,
    pub department_name: Option<&'a str>,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    id: &str,
    fields: ClassroomFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Classroom, sqlx::Error> {
    sqlx::query_as::<_, Classroom>(&format!(
        "INSERT INTO classrooms (
            id, name, room_number, building, block, floor, capacity, has_projector,
            has_computer, has_whiteboard, status, department_name, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(fields.name)
    .bind(fields.room_number)
    .bind(fields.building)
    .bind(fields.block)
    .bind(fields.floor)
    .bind(fields.capacity)
    .bind(fields.has_projector)
    .bind(fields.has_computer)
    .bind(fields.has_whiteboard)
    .bind(fields.status)
    .bind(fields.department_name)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Full replacement of the editable columns.
pub(crate) async fn replace(
    executor: impl PgExecutor<'_>,
    id: &str,
    fields: ClassroomFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Option<Classroom>, sqlx::Error> {
    sqlx::query_as::<_, Classroom>(&format!(
        "UPDATE classrooms SET
            name = $1, room_number = $2, building = $3, block = $4, floor = $5,
            capacity = $6, has_projector = $7, has_computer = $8, has_whiteboard = $9,
            status = $10, department_name = $11, updated_at = $12
         WHERE id = $13
         RETURNING {COLUMNS}",
    ))
    .bind(fields.name)
    .bind(fields.room_number)
    .bind(fields.building)
    .bind(fields.block)
    .bind(fields.floor)
    .bind(fields.capacity)
    .bind(fields.has_projector)
    .bind(fields.has_computer)
    .bind(fields.has_whiteboard)
    .bind(fields.status)
    .bind(fields.department_name)
    .bind(now)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM classrooms WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ClassroomListRow {
    #[sqlx(flatten)]
    pub(crate) classroom: Classroom,
    pub(crate) total_count: i64,
}

#[derive(Clone, Copy, Default)]
pub(crate) struct ListClassroomsParams<'a> {
    pub search: Option<&'a str>,
    pub status: Option<ClassroomStatus>,
    pub building: Option<&'a str>,
    pub block: Option<&'a str>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub has_projector: Option<bool>,
    pub has_computer: Option<bool>,
    pub has_whiteboard: Option<bool>,
    pub offset: i64,
    pub limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    params: ListClassroomsParams<'_>,
) -> Result<Vec<ClassroomListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS}, COUNT(*) OVER() AS total_count FROM classrooms WHERE TRUE"
    ));
    push_filters(&mut builder, params);

    builder
        .push(" ORDER BY building ASC, room_number ASC OFFSET ")
        .push_bind(params.offset)
        .push(" LIMIT ")
        .push_bind(params.limit);

    builder.build_query_as::<ClassroomListRow>().fetch_all(pool).await
}

/// Total rows matching the filters, ignoring offset and limit.
pub(crate) async fn count(
    pool: &PgPool,
    params: ListClassroomsParams<'_>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM classrooms WHERE TRUE");
    push_filters(&mut builder, params);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: ListClassroomsParams<'_>) {
    if let Some(search) = params.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR room_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR building ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = params.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(building) = params.building {
        builder.push(" AND building = ").push_bind(building.to_string());
    }
    if let Some(block) = params.block {
        builder.push(" AND block = ").push_bind(block.to_string());
    }
    if let Some(min_capacity) = params.min_capacity {
        builder.push(" AND capacity >= ").push_bind(min_capacity);
    }
    if let Some(max_capacity) = params.max_capacity {
        builder.push(" AND capacity <= ").push_bind(max_capacity);
    }
    for (column, flag) in [
        ("has_projector", params.has_projector),
        ("has_computer", params.has_computer),
        ("has_whiteboard", params.has_whiteboard),
    ] {
        if let Some(flag) = flag {
            builder.push(format!(" AND {column} = ")).push_bind(flag);
        }
    }
}
