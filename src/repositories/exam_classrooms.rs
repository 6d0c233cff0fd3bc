use sqlx::PgExecutor;
use time::PrimitiveDateTime;

use crate::db::types::ClassroomStatus;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LinkedClassroomRow {
    pub(crate) id: String,
    pub(crate) classroom_id: String,
    pub(crate) name: String,
    pub(crate) room_number: String,
    pub(crate) building: String,
    pub(crate) capacity: i32,
    pub(crate) status: ClassroomStatus,
    pub(crate) required_invigilators: i32,
    pub(crate) notes: Option<String>,
}

pub(crate) struct LinkClassroom<'a> {
    pub classroom_id: &'a str,
    pub required_invigilators: i32,
    pub notes: Option<&'a str>,
}

pub(crate) async fn insert(
    executor: impl PgExecutor<'_>,
    exam_id: &str,
    link: LinkClassroom<'_>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_classrooms (
            id, exam_id, classroom_id, required_invigilators, notes, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(exam_id)
    .bind(link.classroom_id)
    .bind(link.required_invigilators)
    .bind(link.notes)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn delete_for_exam(
    executor: impl PgExecutor<'_>,
    exam_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exam_classrooms WHERE exam_id = $1")
        .bind(exam_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_for_exam(
    executor: impl PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<LinkedClassroomRow>, sqlx::Error> {
    sqlx::query_as::<_, LinkedClassroomRow>(
        "SELECT ec.id, ec.classroom_id, c.name, c.room_number, c.building, c.capacity,
                c.status, ec.required_invigilators, ec.notes
         FROM exam_classrooms ec
         JOIN classrooms c ON c.id = ec.classroom_id
         WHERE ec.exam_id = $1
         ORDER BY c.building, c.room_number",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}
