use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime, Time};

use crate::db::types::{
    AssignmentStatus, ClassroomStatus, ExamStatus, Gender, NotificationKind, UserRole, UserStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
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
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) exam_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) duration_minutes: i32,
    pub(crate) status: ExamStatus,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Classroom {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) room_number: String,
    pub(crate) building: String,
    pub(crate) block: Option<String>,
    pub(crate) floor: i32,
    pub(crate) capacity: i32,
    pub(crate) has_projector: bool,
    pub(crate) has_computer: bool,
    pub(crate) has_whiteboard: bool,
    pub(crate) status: ClassroomStatus,
    pub(crate) department_name: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: String,
    pub(crate) invigilator_id: String,
    pub(crate) exam_id: String,
    pub(crate) classroom_id: String,
    pub(crate) assigned_by: String,
    pub(crate) status: AssignmentStatus,
    pub(crate) notes: Option<String>,
    pub(crate) response_note: Option<String>,
    pub(crate) response_time: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) kind: NotificationKind,
    pub(crate) related_id: Option<String>,
    pub(crate) is_read: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AuditLog {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) action: String,
    pub(crate) resource_type: String,
    pub(crate) resource_id: Option<String>,
    pub(crate) details: Json<serde_json::Value>,
    pub(crate) created_at: PrimitiveDateTime,
}
