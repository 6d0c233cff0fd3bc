use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::shutdown::shutdown_channel;
use crate::core::state::AppState;
use crate::tasks::maintenance;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let period = Duration::from_secs(state.settings().maintenance().interval_seconds);
    tracing::info!(interval_seconds = period.as_secs(), "Maintenance worker started");

    let handle = tokio::spawn(maintenance_loop(state, period, shutdown_channel()));
    if let Err(err) = handle.await {
        tracing::error!(error = %err, "Maintenance task join failed");
    }

    tracing::info!("Maintenance worker stopped");
    Ok(())
}

async fn maintenance_loop(state: AppState, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = maintenance::run_once(state.db()).await {
                    tracing::error!(error = %err, "Maintenance pass failed");
                }
            }
        }
    }
}
