use sqlx::PgExecutor;
use time::Date;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SystemCounts {
    pub(crate) total_users: i64,
    pub(crate) pending_users: i64,
    pub(crate) total_invigilators: i64,
    pub(crate) total_exams: i64,
    pub(crate) upcoming_exams: i64,
    pub(crate) total_classrooms: i64,
    pub(crate) total_assignments: i64,
    pub(crate) pending_assignments: i64,
    pub(crate) accepted_assignments: i64,
    pub(crate) rejected_assignments: i64,
    pub(crate) completed_assignments: i64,
}

pub(crate) async fn system_counts(
    executor: impl PgExecutor<'_>,
    today: Date,
) -> Result<SystemCounts, sqlx::Error> {
    sqlx::query_as::<_, SystemCounts>(
        "SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE status = 'pending') AS pending_users,
            (SELECT COUNT(*) FROM users WHERE role = 'invigilator' AND status = 'approved')
                AS total_invigilators,
            (SELECT COUNT(*) FROM exams) AS total_exams,
            (SELECT COUNT(*) FROM exams WHERE exam_date >= $1 AND status = 'scheduled')
                AS upcoming_exams,
            (SELECT COUNT(*) FROM classrooms) AS total_classrooms,
            (SELECT COUNT(*) FROM assignments) AS total_assignments,
            (SELECT COUNT(*) FROM assignments WHERE status = 'pending') AS pending_assignments,
            (SELECT COUNT(*) FROM assignments WHERE status = 'accepted') AS accepted_assignments,
            (SELECT COUNT(*) FROM assignments WHERE status = 'rejected') AS rejected_assignments,
            (SELECT COUNT(*) FROM assignments WHERE status = 'completed') AS completed_assignments",
    )
    .bind(today)
    .fetch_one(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InvigilatorCounts {
    pub(crate) total: i64,
    pub(crate) pending: i64,
    pub(crate) accepted: i64,
    pub(crate) rejected: i64,
    pub(crate) completed: i64,
    pub(crate) upcoming: i64,
}

pub(crate) async fn invigilator_counts(
    executor: impl PgExecutor<'_>,
    invigilator_id: &str,
    today: Date,
) -> Result<InvigilatorCounts, sqlx::Error> {
    sqlx::query_as::<_, InvigilatorCounts>(
        "SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE a.status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE a.status = 'accepted') AS accepted,
            COUNT(*) FILTER (WHERE a.status = 'rejected') AS rejected,
            COUNT(*) FILTER (WHERE a.status = 'completed') AS completed,
            COUNT(*) FILTER (WHERE a.status = 'accepted' AND e.exam_date >= $2) AS upcoming
         FROM assignments a
         JOIN exams e ON e.id = a.exam_id
         WHERE a.invigilator_id = $1",
    )
    .bind(invigilator_id)
    .bind(today)
    .fetch_one(executor)
    .await
}
