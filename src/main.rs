//! Practice Timer - daily practice checklist with drift-free task timers
//! 
//! This is the main entry point for the practice-timer server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use practice_timer::{
    alarm::{AudioDevice, SilentDevice, TerminalBell},
    api::create_router,
    clock::SystemClock,
    config::{AlarmBackend, Config},
    engine::TaskEngine,
    state::AppState,
    store::FileStore,
    tasks::day_rollover_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("practice_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting practice-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms, data_dir={}",
          config.host, config.port, config.tick_ms, config.store_dir().display());

    let store = Arc::new(FileStore::open(config.store_dir())?);
    let device: Arc<dyn AudioDevice> = match config.alarm {
        AlarmBackend::Bell => Arc::new(TerminalBell::default()),
        AlarmBackend::Silent => Arc::new(SilentDevice::new()),
    };
    let engine = TaskEngine::load(store, Arc::new(SystemClock), device, config.tick_interval());

    // Start the day rollover background task
    let rollover_engine = Arc::clone(&engine);
    let rollover_interval = config.rollover_interval();
    tokio::spawn(async move {
        day_rollover_task(rollover_engine, rollover_interval).await;
    });

    let state = Arc::new(AppState::new(Arc::clone(&engine), config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;
    
    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /tasks                - Current task list");
    info!("  POST /tasks/:id/start      - Start a task timer");
    info!("  POST /tasks/:id/pause      - Pause a task timer");
    info!("  POST /tasks/:id/reset      - Reset a task");
    info!("  POST /tasks/:id/toggle     - Toggle task completion");
    info!("  POST /tasks/:id/stop-alarm - Acknowledge a finished timer");
    info!("  POST /tasks/reset-all      - Reset every task");
    info!("  GET  /events               - Task updates as server-sent events");
    info!("  GET  /status               - Progress and server status");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);
    
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = engine.shutdown() {
        tracing::error!("Failed to stop task engine cleanly: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
