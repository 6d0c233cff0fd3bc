use sqlx::types::Json;
use sqlx::PgExecutor;
use time::PrimitiveDateTime;


pub(crate) struct CreateAuditLog<'a> {
    pub user_id: &'a str,
    pub action: &'a str,
    pub resource_type: &'a str,
    pub resource_id: Option<&'a str>,
    pub details: serde_json::Value,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn insert(
    executor: impl PgExecutor<'_>,
    params: CreateAuditLog<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs (
            id, user_id, action, resource_type, resource_id, details, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(params.user_id)
    .bind(params.action)
    .bind(params.resource_type)
    .bind(params.resource_id)
    .bind(Json(params.details))
    .bind(params.now)
    .execute(executor)
    .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn list_for_resource(
    executor: impl PgExecutor<'_>,
    resource_type: &str,
    resource_id: &str,
) -> Result<Vec<crate::db::models::AuditLog>, sqlx::Error> {
    sqlx::query_as::<_, crate::db::models::AuditLog>(
        "SELECT id, user_id, action, resource_type, resource_id, details, created_at
         FROM audit_logs
         WHERE resource_type = $1 AND resource_id = $2
         ORDER BY created_at, id",
    )
    .bind(resource_type)
    .bind(resource_id)
    .fetch_all(executor)
    .await
}
