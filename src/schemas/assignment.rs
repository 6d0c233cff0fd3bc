use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive, format_time};
use crate::db::types::{AssignmentStatus, ExamStatus};
use crate::repositories::assignments::AssignmentDetailRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(alias = "invigilatorId")]
    #[validate(length(min = 1, message = "invigilator_id must not be empty"))]
    pub(crate) invigilator_id: String,
    #[serde(alias = "examId")]
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(alias = "classroomId")]
    #[validate(length(min = 1, message = "classroom_id must not be empty"))]
    pub(crate) classroom_id: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "notes are too long"))]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentStatusUpdate {
    pub(crate) status: AssignmentStatus,
    #[serde(default, alias = "responseNote")]
    #[validate(length(max = 2000, message = "response_note is too long"))]
    pub(crate) response_note: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentInvigilator {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) department: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentExam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) exam_date: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) status: ExamStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentClassroom {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) room_number: String,
    pub(crate) building: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentAssigner {
    pub(crate) id: String,
    pub(crate) full_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) status: AssignmentStatus,
    pub(crate) notes: Option<String>,
    pub(crate) response_note: Option<String>,
    pub(crate) response_time: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) invigilator: AssignmentInvigilator,
    pub(crate) exam: AssignmentExam,
    pub(crate) classroom: AssignmentClassroom,
    pub(crate) assigned_by: AssignmentAssigner,
}

impl AssignmentResponse {
    pub(crate) fn from_detail(row: AssignmentDetailRow) -> Self {
        let assignment = row.assignment;
        Self {
            id: assignment.id,
            status: assignment.status,
            notes: assignment.notes,
            response_note: assignment.response_note,
            response_time: assignment.response_time.map(format_primitive),
            created_at: format_primitive(assignment.created_at),
            updated_at: format_primitive(assignment.updated_at),
            invigilator: AssignmentInvigilator {
                id: assignment.invigilator_id,
                full_name: row.invigilator_name,
                username: row.invigilator_username,
                email: row.invigilator_email,
                department: row.invigilator_department,
            },
            exam: AssignmentExam {
                id: assignment.exam_id,
                title: row.exam_title,
                exam_date: format_date(row.exam_date),
                start_time: format_time(row.exam_start_time),
                end_time: format_time(row.exam_end_time),
                status: row.exam_status,
            },
            classroom: AssignmentClassroom {
                id: assignment.classroom_id,
                name: row.classroom_name,
                room_number: row.classroom_room_number,
                building: row.classroom_building,
            },
            assigned_by: AssignmentAssigner {
                id: assignment.assigned_by,
                full_name: row.assigned_by_name,
            },
        }
    }
}
