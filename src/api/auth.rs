use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{non_blank, validate_payload, validate_username};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{UserRole, UserStatus};
use crate::repositories;
use crate::schemas::auth::{MessageResponse, RegisterResponse, TokenResponse};
use crate::schemas::user::{ChangePasswordRequest, LoginRequest, RegisterRequest, UserResponse};
use crate::services::audit::{self, AuditEntry};

/// Max attempts per window for login and registration.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}

async fn check_rate_limit(
    state: &AppState,
    key: String,
    message: &'static str,
) -> Result<(), ApiError> {
    let allowed = state
        .redis()
        .rate_limit(&key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Rate limit check failed; allowing request");
            true
        });

    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests(message))
    }
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    validate_payload(&payload)?;
    let username = payload.username.trim();
    validate_username(username)?;
    let email = payload.email.trim().to_ascii_lowercase();

    check_rate_limit(
        &state,
        format!("rl:register:{username}"),
        "Too many registration attempts, try again later",
    )
    .await?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::users::lock_registration(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock registration"))?;

    let existing = repositories::users::find_conflicting(&mut *tx, username, &email, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username or email is already registered".to_string()));
    }

    let first_user = repositories::users::count_all(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?
        == 0;

    let (role, status) = if first_user {
        (UserRole::Admin, UserStatus::Approved)
    } else if payload.role == Some(UserRole::Admin) {
        return Err(ApiError::BadRequest("Admin accounts cannot be self-registered".to_string()));
    } else {
        (UserRole::Invigilator, UserStatus::Pending)
    };

    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            email: &email,
            hashed_password,
            full_name: payload.full_name.trim(),
            role,
            status,
            gender: payload.gender,
            phone_number: non_blank(payload.phone_number.as_deref()),
            department: non_blank(payload.department.as_deref()),
            designation: non_blank(payload.designation.as_deref()),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("Username or email is already registered".to_string())
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit registration"))?;

    tracing::info!(
        user_id = %user.id,
        role = user.role.as_str(),
        status = user.status.as_str(),
        action = "user_register",
        "User registered"
    );

    let message = if first_user {
        "Registration successful. You are the first user and have been made an administrator."
    } else {
        "Registration successful. Your account is awaiting administrator approval."
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { message: message.to_string(), user: UserResponse::from_db(user) }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    }

    check_rate_limit(
        &state,
        format!("rl:login:{username}"),
        "Too many login attempts, try again later",
    )
    .await?;

    let user = repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is deactivated"));
    }
    match user.status {
        UserStatus::Approved => {}
        UserStatus::Pending => return Err(ApiError::Forbidden("Account is awaiting approval")),
        UserStatus::Rejected => return Err(ApiError::Forbidden("Account has been rejected")),
    }

    let settings = state.settings();
    let token = security::create_access_token(&user.id, user.role.as_str(), settings, None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(user_id = %user.id, action = "user_login", "User logged in");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in: settings.security().access_token_expire_minutes * 60,
        user: UserResponse::from_db(user),
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_payload(&payload)?;

    let verified = security::verify_password(&payload.current_password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    let hashed_password = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    repositories::users::update(
        state.db(),
        &user.id,
        repositories::users::UpdateUser {
            hashed_password: Some(hashed_password),
            ..Default::default()
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    audit::record(
        state.db(),
        AuditEntry {
            actor_id: &user.id,
            action: "change_password",
            resource_type: "user",
            resource_id: Some(&user.id),
            details: serde_json::json!({}),
        },
    )
    .await;

    Ok(Json(MessageResponse { message: "Password updated successfully".to_string() }))
}
