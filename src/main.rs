//! Timer Panel - entry point
//!
//! Restores the persisted timers, starts the render loop and serves the
//! panel over HTTP until a shutdown signal arrives.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use timer_panel::{
    api::create_router,
    clock::{Clock, SystemClock},
    config::Config,
    panel::TimerPanel,
    state::AppState,
    storage::{JsonFileStore, KvStore, MemoryStore, Persister},
    tasks::{persistence_notice_task, render_loop_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_panel={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-panel v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_ms);

    let backend: Arc<dyn KvStore> = if config.in_memory {
        info!("Timers are kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        info!("Persisting timers to {}", config.data_file.display());
        Arc::new(JsonFileStore::new(&config.data_file))
    };
    let persister = Persister::new(backend);
    let failures = persister.subscribe();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let panel = TimerPanel::restore(clock, persister).await;

    let state = Arc::new(AppState::new(
        panel,
        config.port,
        config.host.clone(),
        config.tick_interval(),
    ));

    // Surface failed writes to clients
    tokio::spawn(persistence_notice_task(Arc::clone(&state), failures));

    // Start the shared render loop
    tokio::spawn(render_loop_task(Arc::clone(&state)));

    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers               - List timers");
    info!("  POST   /timers               - Create a stopwatch or countdown");
    info!("  POST   /timers/:id/<action>  - start, pause, toggle, reset, attempts, chart");
    info!("  DELETE /timers/:id           - Delete a timer");
    info!("  GET    /timers/:id/chart.svg - Attempt chart");
    info!("  PUT    /timers/:id/layout    - Resize a mounted chart");
    info!("  GET    /panel                - Mounted views");
    info!("  PUT    /panel/filter         - Switch stopwatch/countdown filter");
    info!("  GET    /status               - Panel status and notices");

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
