mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use cadence_channels::DispatchTable;
use cadence_orchestrator::{EngineSettings, Orchestrator};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    scheduler::SchedulerContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(cadence_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let brands = Arc::new(cadence_core::load_brands(&config.brands_path)?);
    let feed = cadence_core::load_signal_feed(config.signals_path.as_deref())?;
    let opened = cadence_db::open_store(&config).await?;
    let channels = DispatchTable::from_config(&config)?;
    tracing::info!(
        env = %config.env,
        store = %config.store_backend,
        platforms = ?channels.platforms(),
        "starting cadence-server"
    );

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&opened.store),
        channels,
        feed,
        EngineSettings::from_app_config(&config),
    ));

    let _scheduler = scheduler::build_scheduler(SchedulerContext {
        orchestrator: Arc::clone(&orchestrator),
        store: Arc::clone(&opened.store),
        brands: Arc::clone(&brands),
        daily_cron: config.daily_cron.clone(),
        cleanup_cron: config.cleanup_cron.clone(),
        retention_days: config.retention_days,
    })
    .await?;

    let auth = AuthState::new(&config.api_keys, config.is_development())?;
    let state = AppState {
        store: opened.store,
        orchestrator,
        brands,
        retention_days: config.retention_days,
        pool: opened.pool,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
