use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct SystemStatsResponse {
    pub(crate) total_users: i64,
    pub(crate) pending_users: i64,
    pub(crate) total_invigilators: i64,
    pub(crate) total_exams: i64,
    pub(crate) upcoming_exams: i64,
    pub(crate) total_classrooms: i64,
    pub(crate) total_assignments: i64,
    pub(crate) pending_assignments: i64,
    pub(crate) accepted_assignments: i64,
    pub(crate) rejected_assignments: i64,
    pub(crate) completed_assignments: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct InvigilatorStatsResponse {
    pub(crate) total_assignments: i64,
    pub(crate) pending_assignments: i64,
    pub(crate) accepted_assignments: i64,
    pub(crate) rejected_assignments: i64,
    pub(crate) completed_assignments: i64,
    pub(crate) upcoming_assignments: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct MonthlyExamCount {
    pub(crate) month: u8,
    pub(crate) name: &'static str,
    pub(crate) count: i64,
}

const MONTH_NAMES: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Expands sparse `(month, count)` rows into all twelve months.
pub(crate) fn fill_months(rows: &[(i32, i64)]) -> Vec<MonthlyExamCount> {
    (1u8..=12)
        .map(|month| MonthlyExamCount {
            month,
            name: MONTH_NAMES[usize::from(month - 1)],
            count: rows
                .iter()
                .find(|(m, _)| *m == i32::from(month))
                .map(|(_, count)| *count)
                .unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::fill_months;

    #[test]
    fn fill_months_covers_the_whole_year() {
        let months = fill_months(&[(2, 3), (12, 1)]);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].count, 0);
        assert_eq!(months[1].count, 3);
        assert_eq!(months[1].name, "Feb");
        assert_eq!(months[11].count, 1);
    }
}
