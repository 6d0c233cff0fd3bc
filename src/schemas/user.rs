use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::{Gender, UserRole, UserStatus};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub(crate) username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub(crate) password: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, max = 255, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    pub(crate) gender: Option<Gender>,
    #[serde(default, alias = "phoneNumber")]
    #[validate(length(max = 32, message = "phone_number is too long"))]
    pub(crate) phone_number: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default)]
    pub(crate) designation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChangePasswordRequest {
    #[serde(alias = "currentPassword")]
    pub(crate) current_password: String,
    #[serde(alias = "newPassword")]
    #[validate(length(min = 8, message = "new_password must be at least 8 characters"))]
    pub(crate) new_password: String,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default, alias = "fullName")]
    #[validate(length(min = 1, max = 255, message = "full_name must not be empty"))]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) gender: Option<Gender>,
    #[serde(default, alias = "phoneNumber")]
    #[validate(length(max = 32, message = "phone_number is too long"))]
    pub(crate) phone_number: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default)]
    pub(crate) designation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserUpdate {
    #[serde(flatten)]
    #[validate(nested)]
    pub(crate) profile: ProfileUpdate,
    #[serde(default, alias = "isActive")]
    pub(crate) is_active: Option<bool>,
    #[serde(default, alias = "maxDutiesPerDay")]
    #[validate(range(min = 0, max = 24, message = "max_duties_per_day must be 0-24"))]
    pub(crate) max_duties_per_day: Option<i32>,
    #[serde(default, alias = "maxDutiesPerWeek")]
    #[validate(range(min = 0, max = 100, message = "max_duties_per_week must be 0-100"))]
    pub(crate) max_duties_per_week: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserStatusUpdate {
    pub(crate) status: UserStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) status: UserStatus,
    pub(crate) gender: Option<Gender>,
    pub(crate) phone_number: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) designation: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) max_duties_per_day: i32,
    pub(crate) max_duties_per_week: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            status: user.status,
            gender: user.gender,
            phone_number: user.phone_number,
            department: user.department,
            designation: user.designation,
            is_active: user.is_active,
            max_duties_per_day: user.max_duties_per_day,
            max_duties_per_week: user.max_duties_per_week,
            created_at: format_primitive(user.created_at),
            updated_at: format_primitive(user.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_rejects_short_password_and_bad_email() {
        let payload: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "inv1",
            "email": "not-an-email",
            "password": "short",
            "fullName": "Invigilator One"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("username"));
    }

    #[test]
    fn admin_update_checks_capacity_ranges() {
        let payload: AdminUserUpdate = serde_json::from_value(serde_json::json!({
            "max_duties_per_day": 30,
            "department": "Physics"
        }))
        .unwrap();

        assert_eq!(payload.profile.department.as_deref(), Some("Physics"));
        assert!(payload.validate().is_err());
    }
}
