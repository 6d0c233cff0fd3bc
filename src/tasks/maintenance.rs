use sqlx::PgPool;

use crate::core::metrics;
use crate::core::time::{primitive_now_utc, today_utc};
use crate::repositories;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MaintenanceReport {
    pub(crate) exams_started: u64,
    pub(crate) assignments_completed: u64,
    pub(crate) exams_completed: u64,
}

/// Advances exams and accepted assignments past their scheduled window.
///
/// Assignments are completed before their exams so both updates see the same
/// set of finished exams inside one transaction.
pub(crate) async fn run_once(pool: &PgPool) -> Result<MaintenanceReport, sqlx::Error> {
    let now = primitive_now_utc();
    let today = today_utc();
    let now_time = now.time();

    let mut tx = pool.begin().await?;

    let exams_started =
        repositories::exams::start_running(&mut *tx, today, now_time, now).await?;
    let completed_ids =
        repositories::assignments::complete_finished(&mut *tx, today, now_time, now).await?;
    let exams_completed =
        repositories::exams::complete_finished(&mut *tx, today, now_time, now).await?;

    tx.commit().await?;

    let report = MaintenanceReport {
        exams_started,
        assignments_completed: completed_ids.len() as u64,
        exams_completed,
    };
    metrics::assignments_completed(report.assignments_completed);

    if report != MaintenanceReport::default() {
        tracing::info!(
            exams_started = report.exams_started,
            assignments_completed = report.assignments_completed,
            exams_completed = report.exams_completed,
            "Maintenance pass applied"
        );
    } else {
        tracing::debug!("Maintenance pass found nothing to update");
    }

    Ok(report)
}
