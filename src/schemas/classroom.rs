use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Classroom;
use crate::db::types::ClassroomStatus;
use crate::repositories::classrooms::ClassroomFields;

/// Body for both create and full replacement.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassroomInput {
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "roomNumber")]
    #[validate(length(min = 1, max = 50, message = "room_number must be 1-50 characters"))]
    pub(crate) room_number: String,
    #[validate(length(min = 1, max = 255, message = "building must not be empty"))]
    pub(crate) building: String,
    #[serde(default)]
    pub(crate) block: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "floor must be non-negative"))]
    pub(crate) floor: i32,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub(crate) capacity: i32,
    #[serde(default, alias = "hasProjector")]
    pub(crate) has_projector: bool,
    #[serde(default, alias = "hasComputer")]
    pub(crate) has_computer: bool,
    #[serde(default = "default_true", alias = "hasWhiteboard")]
    pub(crate) has_whiteboard: bool,
    #[serde(default = "default_status")]
    pub(crate) status: ClassroomStatus,
    #[serde(default, alias = "departmentName")]
    pub(crate) department_name: Option<String>,
}

impl ClassroomInput {
    pub(crate) fn fields(&self) -> ClassroomFields<'_> {
        ClassroomFields {
            name: self.name.trim(),
            room_number: self.room_number.trim(),
            building: self.building.trim(),
            block: self.block.as_deref(),
            floor: self.floor,
            capacity: self.capacity,
            has_projector: self.has_projector,
            has_computer: self.has_computer,
            has_whiteboard: self.has_whiteboard,
            status: self.status,
            department_name: self.department_name.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassroomResponse {
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
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ClassroomResponse {
    pub(crate) fn from_db(classroom: Classroom) -> Self {
        Self {
            id: classroom.id,
            name: classroom.name,
            room_number: classroom.room_number,
            building: classroom.building,
            block: classroom.block,
            floor: classroom.floor,
            capacity: classroom.capacity,
            has_projector: classroom.has_projector,
            has_computer: classroom.has_computer,
            has_whiteboard: classroom.has_whiteboard,
            status: classroom.status,
            department_name: classroom.department_name,
            created_at: format_primitive(classroom.created_at),
            updated_at: format_primitive(classroom.updated_at),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_status() -> ClassroomStatus {
    ClassroomStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let input: ClassroomInput = serde_json::from_value(serde_json::json!({
            "name": "Main Hall",
            "roomNumber": " A-101 ",
            "building": "Science",
            "capacity": 60
        }))
        .unwrap();

        assert!(input.validate().is_ok());
        let fields = input.fields();
        assert_eq!(fields.room_number, "A-101");
        assert!(fields.has_whiteboard);
        assert!(!fields.has_projector);
        assert_eq!(fields.status, ClassroomStatus::Active);
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let input: ClassroomInput = serde_json::from_value(serde_json::json!({
            "name": "Closet",
            "room_number": "B-0",
            "building": "Annex",
            "capacity": 0,
            "floor": -1
        }))
        .unwrap();

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("capacity"));
        assert!(errors.field_errors().contains_key("floor"));
    }
}
