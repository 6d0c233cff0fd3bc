use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::{Gender, UserRole, UserStatus};

pub(crate) const COLUMNS: &str = "\
    id, username, email, hashed_password, full_name, role, status, gender, \
    phone_number, department, designation, is_active, max_duties_per_day, \
    max_duties_per_week, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_username(
    executor: impl PgExecutor<'_>,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Returns the id of any user already holding `username` or `email`.
pub(crate) async fn find_conflicting(
    executor: impl PgExecutor<'_>,
    username: &str,
    email: &str,
    exclude_id: Option<&str>,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM users
         WHERE (username = $1 OR lower(email) = lower($2))
           AND ($3::text IS NULL OR id <> $3)
         LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .bind(exclude_id)
    .fetch_optional(executor)
    .await
}

/// Serializes registrations so only one caller can observe an empty table.
pub(crate) async fn lock_registration(executor: impl PgExecutor<'_>) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('users_registration'))")
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn count_all(executor: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(executor).await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub full_name: &'a str,
    pub role: UserRole,
    pub status: UserStatus,
    pub gender: Option<Gender>,
    pub phone_number: Option<&'a str>,
    pub department: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, username, email, hashed_password, full_name, role, status, gender,
            phone_number, department, designation, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,TRUE,$12,$12)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.full_name)
    .bind(params.role)
    .bind(params.status)
    .bind(params.gender)
    .bind(params.phone_number)
    .bind(params.department)
    .bind(params.designation)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

#[derive(Default)]
pub(crate) struct UpdateUser {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub is_active: Option<bool>,
    pub max_duties_per_day: Option<i32>,
    pub max_duties_per_week: Option<i32>,
    pub hashed_password: Option<String>,
}

pub(crate) async fn update(
    executor: impl PgExecutor<'_>,
    id: &str,
    params: UpdateUser,
    now: PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            email = COALESCE($2, email),
            gender = COALESCE($3, gender),
            phone_number = COALESCE($4, phone_number),
            department = COALESCE($5, department),
            designation = COALESCE($6, designation),
            role = COALESCE($7, role),
            status = COALESCE($8, status),
            is_active = COALESCE($9, is_active),
            max_duties_per_day = COALESCE($10, max_duties_per_day),
            max_duties_per_week = COALESCE($11, max_duties_per_week),
            hashed_password = COALESCE($12, hashed_password),
            updated_at = $13
         WHERE id = $14
         RETURNING {COLUMNS}",
    ))
    .bind(params.full_name)
    .bind(params.email)
    .bind(params.gender)
    .bind(params.phone_number)
    .bind(params.department)
    .bind(params.designation)
    .bind(params.role)
    .bind(params.status)
    .bind(params.is_active)
    .bind(params.max_duties_per_day)
    .bind(params.max_duties_per_week)
    .bind(params.hashed_password)
    .bind(now)
    .bind(id)
    .fetch_optional(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserListRow {
    #[sqlx(flatten)]
    pub(crate) user: User,
    pub(crate) total_count: i64,
}

#[derive(Clone, Copy)]
pub(crate) struct ListUsersParams<'a> {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<&'a str>,
    pub offset: i64,
    pub limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    params: ListUsersParams<'_>,
) -> Result<Vec<UserListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS}, COUNT(*) OVER() AS total_count FROM users WHERE TRUE"
    ));
    push_filters(&mut builder, params);

    builder
        .push(" ORDER BY created_at DESC OFFSET ")
        .push_bind(params.offset)
        .push(" LIMIT ")
        .push_bind(params.limit);

    builder.build_query_as::<UserListRow>().fetch_all(pool).await
}

/// Total rows matching the filters, ignoring offset and limit.
pub(crate) async fn count(pool: &PgPool, params: ListUsersParams<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
    push_filters(&mut builder, params);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: ListUsersParams<'_>) {
    if let Some(role) = params.role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(status) = params.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = params.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escapes `%`, `_` and `\` so user input is matched literally by `ILIKE`.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
