//! pytitiond: the Pytition data daemon.
//!
//! Single OS process running a Tokio async runtime. The web layer and the
//! mail transport talk to it via JSON-RPC over a Unix socket and subscribe
//! to its events.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;

use pytition_db::accounts::SqliteAccountStore;
use pytition_db::lifecycle::ProfileLifecycle;
use pytition_types::events::EventType;
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Keeps accounts and profiles in step.
    pub profiles: ProfileLifecycle<SqliteAccountStore>,
}

impl DaemonState {
    pub fn new(conn: rusqlite::Connection, config: DaemonConfig) -> Self {
        let event_bus = EventBus::new(config.server.event_buffer);
        Self {
            db: Arc::new(tokio::sync::Mutex::new(conn)),
            config,
            event_bus,
            profiles: ProfileLifecycle::new(SqliteAccountStore),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config (it carries the log level)
    let config = DaemonConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive().parse()?),
        )
        .init();

    info!("Pytition daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db_path = config.database_path();
    let conn = pytition_db::open(&db_path)?;
    info!("Database ready at {:?}", db_path);

    // 3. Build daemon state
    let socket_path = config.socket_path();
    let state = Arc::new(DaemonState::new(conn, config));

    // 4. Start IPC server
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());
    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.event_bus.publish(
        EventType::DaemonStatus,
        serde_json::json!({
            "status": "started",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    );

    // 5. Run the RPC server until interrupted
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    state.event_bus.publish(
        EventType::DaemonStatus,
        serde_json::json!({"status": "stopping"}),
    );

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
