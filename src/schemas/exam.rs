use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{Date, Time};
use validator::Validate;

use crate::core::time::{format_date, format_primitive, format_time, parse_date, parse_time};
use crate::db::models::Exam;
use crate::db::types::{ClassroomStatus, ExamStatus};
use crate::repositories::exam_classrooms::LinkedClassroomRow;
use crate::repositories::exams::ExamListRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamClassroomInput {
    #[serde(alias = "classroomId")]
    #[validate(length(min = 1, message = "classroom_id must not be empty"))]
    pub(crate) classroom_id: String,
    #[serde(default = "default_required_invigilators", alias = "requiredInvigilators")]
    #[validate(range(min = 1, max = 50, message = "required_invigilators must be 1-50"))]
    pub(crate) required_invigilators: i32,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "examDate", deserialize_with = "deserialize_date")]
    pub(crate) exam_date: Date,
    #[serde(alias = "startTime", deserialize_with = "deserialize_time")]
    pub(crate) start_time: Time,
    #[serde(alias = "endTime", deserialize_with = "deserialize_time")]
    pub(crate) end_time: Time,
    /// Derived from the time window when omitted.
    #[serde(default, alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) classrooms: Vec<ExamClassroomInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "examDate", deserialize_with = "deserialize_option_date")]
    pub(crate) exam_date: Option<Date>,
    #[serde(default, alias = "startTime", deserialize_with = "deserialize_option_time")]
    pub(crate) start_time: Option<Time>,
    #[serde(default, alias = "endTime", deserialize_with = "deserialize_option_time")]
    pub(crate) end_time: Option<Time>,
    #[serde(default, alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    pub(crate) status: Option<ExamStatus>,
    /// When present, replaces every classroom link of the exam.
    #[serde(default)]
    #[validate(nested)]
    pub(crate) classrooms: Option<Vec<ExamClassroomInput>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamStatusUpdate {
    pub(crate) status: ExamStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamClassroomResponse {
    pub(crate) id: String,
    pub(crate) classroom_id: String,
    pub(crate) name: String,
    pub(crate) room_number: String,
    pub(crate) building: String,
    pub(crate) capacity: i32,
    pub(crate) status: ClassroomStatus,
    pub(crate) required_invigilators: i32,
    pub(crate) notes: Option<String>,
}

impl From<LinkedClassroomRow> for ExamClassroomResponse {
    fn from(row: LinkedClassroomRow) -> Self {
        Self {
            id: row.id,
            classroom_id: row.classroom_id,
            name: row.name,
            room_number: row.room_number,
            building: row.building,
            capacity: row.capacity,
            status: row.status,
            required_invigilators: row.required_invigilators,
            notes: row.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) exam_date: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: ExamStatus,
    pub(crate) created_by: String,
    pub(crate) created_by_name: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) classrooms: Vec<ExamClassroomResponse>,
}

impl ExamResponse {
    pub(crate) fn from_db(
        exam: Exam,
        created_by_name: Option<String>,
        classrooms: Vec<LinkedClassroomRow>,
    ) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            exam_date: format_date(exam.exam_date),
            start_time: format_time(exam.start_time),
            end_time: format_time(exam.end_time),
            duration_minutes: exam.duration_minutes,
            status: exam.status,
            created_by: exam.created_by,
            created_by_name,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
            classrooms: classrooms.into_iter().map(ExamClassroomResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) exam_date: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: ExamStatus,
    pub(crate) classroom_count: i64,
    pub(crate) assignment_count: i64,
}

impl From<ExamListRow> for ExamSummaryResponse {
    fn from(row: ExamListRow) -> Self {
        let exam = row.exam;
        Self {
            id: exam.id,
            title: exam.title,
            exam_date: format_date(exam.exam_date),
            start_time: format_time(exam.start_time),
            end_time: format_time(exam.end_time),
            duration_minutes: exam.duration_minutes,
            status: exam.status,
            classroom_count: row.classroom_count,
            assignment_count: row.assignment_count,
        }
    }
}

fn default_required_invigilators() -> i32 {
    1
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
}

pub(crate) fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
        None => Ok(None),
    }
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid time: {raw}")))
}

fn deserialize_option_time<'de, D>(deserializer: D) -> Result<Option<Time>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_time(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid time: {raw}"))),
        None => Ok(None),
    }
}
