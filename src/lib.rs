pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};

/// Loads configuration, wires up tracing and metrics, and opens the
/// database pool (migrated) and the Redis handle shared by both binaries.
async fn bootstrap_state() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    match redis.connect().await {
        Ok(()) => tracing::info!("Redis connected"),
        Err(err) => {
            tracing::error!(error = %err, "Redis unavailable; rate limiting disabled")
        }
    }

    Ok(AppState::new(settings, db_pool, redis))
}

async fn close_redis(state: &AppState) {
    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");
}

/// Serves the HTTP API until Ctrl+C or SIGTERM.
pub async fn run() -> anyhow::Result<()> {
    let state = bootstrap_state().await?;

    if let Err(err) = core::bootstrap::ensure_superuser(&state).await {
        tracing::error!(error = %err, "Failed to ensure default superuser");
    }

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        api_prefix = %state.settings().api().api_prefix,
        "Invigilation API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    close_redis(&state).await;
    result?;
    Ok(())
}

/// Runs the periodic maintenance loop until Ctrl+C or SIGTERM.
pub async fn run_worker() -> anyhow::Result<()> {
    let state = bootstrap_state().await?;

    let result = tasks::scheduler::run(state.clone()).await;

    close_redis(&state).await;
    result
}
