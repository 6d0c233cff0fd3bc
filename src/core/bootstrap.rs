use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{UserRole, UserStatus};
use crate::repositories;
use crate::repositories::users::{CreateUser, UpdateUser};

/// Creates the configured administrator, or restores its role, approval and password.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let username = &admin.first_superuser_username;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_username(state.db(), username).await? {
        let password_matches =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);

        let mut changes = UpdateUser::default();
        if !password_matches {
            changes.hashed_password =
                Some(security::hash_password(&admin.first_superuser_password)?);
        }
        if user.role != UserRole::Admin {
            changes.role = Some(UserRole::Admin);
        }
        if user.status != UserStatus::Approved {
            changes.status = Some(UserStatus::Approved);
        }
        if !user.is_active {
            changes.is_active = Some(true);
        }

        let needs_update = changes.hashed_password.is_some()
            || changes.role.is_some()
            || changes.status.is_some()
            || changes.is_active.is_some();

        if needs_update {
            repositories::users::update(state.db(), &user.id, changes, now).await?;
            tracing::info!(username = %username, "Updated default superuser");
        } else {
            tracing::info!("Default superuser already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    repositories::users::create(
        state.db(),
        CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            email: &admin.first_superuser_email,
            hashed_password,
            full_name: "System Administrator",
            role: UserRole::Admin,
            status: UserStatus::Approved,
            gender: None,
            phone_number: None,
            department: None,
            designation: None,
            now,
        },
    )
    .await?;

    tracing::info!(username = %username, "Created default superuser");
    Ok(())
}
