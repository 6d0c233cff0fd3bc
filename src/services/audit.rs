use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::audit_logs::CreateAuditLog;

pub(crate) struct AuditEntry<'a> {
    pub(crate) actor_id: &'a str,
    pub(crate) action: &'a str,
    pub(crate) resource_type: &'a str,
    pub(crate) resource_id: Option<&'a str>,
    pub(crate) details: serde_json::Value,
}

/// Best-effort: failures are logged and swallowed.
pub(crate) async fn record(pool: &PgPool, entry: AuditEntry<'_>) {
    let result = repositories::audit_logs::insert(
        pool,
        CreateAuditLog {
            user_id: entry.actor_id,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            details: entry.details,
            now: primitive_now_utc(),
        },
    )
    .await;

    if let Err(err) = result {
        tracing::warn!(
            error = %err,
            action = entry.action,
            resource_type = entry.resource_type,
            "Failed to write audit log"
        );
    }
}
