use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Notification;
use crate::db::types::NotificationKind;

pub(crate) const COLUMNS: &str = "\
    id, user_id, title, message, kind, related_id, is_read, created_at, updated_at";

pub(crate) struct CreateNotification<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: NotificationKind,
    pub related_id: Option<&'a str>,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn insert(
    executor: impl PgExecutor<'_>,
    params: CreateNotification<'_>,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (
            id, user_id, title, message, kind, related_id, is_read, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,FALSE,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(params.user_id)
    .bind(params.title)
    .bind(params.message)
    .bind(params.kind)
    .bind(params.related_id)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct NotificationListRow {
    #[sqlx(flatten)]
    pub(crate) notification: Notification,
    pub(crate) total_count: i64,
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    is_read: Option<bool>,
    offset: i64,
    limit: i64,
) -> Result<Vec<NotificationListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS}, COUNT(*) OVER() AS total_count FROM notifications WHERE user_id = "
    ));
    builder.push_bind(user_id.to_string());

    if let Some(is_read) = is_read {
        builder.push(" AND is_read = ").push_bind(is_read);
    }

    builder
        .push(" ORDER BY created_at DESC, id ASC OFFSET ")
        .push_bind(offset)
        .push(" LIMIT ")
        .push_bind(limit);

    builder.build_query_as::<NotificationListRow>().fetch_all(pool).await
}

pub(crate) async fn count_for_user(
    executor: impl PgExecutor<'_>,
    user_id: &str,
    is_read: Option<bool>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications
         WHERE user_id = $1 AND ($2::boolean IS NULL OR is_read = $2)",
    )
    .bind(user_id)
    .bind(is_read)
    .fetch_one(executor)
    .await
}

pub(crate) async fn count_unread(
    executor: impl PgExecutor<'_>,
    user_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[cfg(test)]
pub(crate) async fn list_by_related(
    executor: impl PgExecutor<'_>,
    related_id: &str,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE related_id = $1 ORDER BY created_at, id"
    ))
    .bind(related_id)
    .fetch_all(executor)
    .await
}

/// Scoped to the owner so foreign ids behave like missing ones.
pub(crate) async fn mark_read(
    executor: impl PgExecutor<'_>,
    id: &str,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = TRUE, updated_at = $3
         WHERE id = $1 AND user_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(now)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn mark_all_read(
    executor: impl PgExecutor<'_>,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE, updated_at = $2
         WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete_for_user(
    executor: impl PgExecutor<'_>,
    id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
