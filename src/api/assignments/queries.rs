use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::db::types::AssignmentStatus;
use crate::repositories::assignments::AssignmentSort;
use crate::repositories::SortOrder;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListAssignmentsQuery {
    #[serde(default)]
    pub(super) page: Option<i64>,
    #[serde(default)]
    pub(super) limit: Option<i64>,
    /// A single status or a comma-separated set.
    #[serde(default)]
    pub(super) status: Option<String>,
    #[serde(default, alias = "examId")]
    pub(super) exam_id: Option<String>,
    #[serde(default, alias = "invigilatorId")]
    pub(super) invigilator_id: Option<String>,
    #[serde(default)]
    pub(super) search: Option<String>,
    #[serde(default, alias = "sortBy")]
    pub(super) sort_by: AssignmentSort,
    #[serde(default, alias = "sortOrder")]
    pub(super) sort_order: SortOrder,
    #[serde(default, alias = "includePast")]
    pub(super) include_past: bool,
}

impl ListAssignmentsQuery {
    pub(super) fn statuses(&self) -> Result<Vec<AssignmentStatus>, ApiError> {
        parse_statuses(self.status.as_deref())
    }
}

fn parse_statuses(raw: Option<&str>) -> Result<Vec<AssignmentStatus>, ApiError> {
    let mut statuses = Vec::new();
    for part in raw.unwrap_or_default().split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let status = part
            .parse::<AssignmentStatus>()
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}
