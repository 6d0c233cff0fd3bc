use serde::Deserialize;
use time::Date;

use crate::db::types::ExamStatus;
use crate::repositories::exams::ExamSort;
use crate::repositories::SortOrder;
use crate::schemas::exam::deserialize_option_date;

#[derive(Debug, Deserialize)]
pub(super) struct ListExamsQuery {
    #[serde(default)]
    pub(super) page: Option<i64>,
    #[serde(default)]
    pub(super) limit: Option<i64>,
    #[serde(default)]
    pub(super) status: Option<ExamStatus>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(super) date: Option<Date>,
    #[serde(default)]
    pub(super) search: Option<String>,
    #[serde(default, alias = "sortBy")]
    pub(super) sort_by: ExamSort,
    #[serde(default, alias = "sortOrder")]
    pub(super) sort_order: SortOrder,
}
