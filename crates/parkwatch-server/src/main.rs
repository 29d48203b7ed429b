//! Parkwatch server binary.
//!
//! Wires configuration, the history backend, the parking service and the
//! HTTP/WebSocket server together, then serves until `Ctrl-C` or
//! `SIGTERM`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$PARKWATCH_CONFIG` or `parkwatch-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Select the history backend: `PostgreSQL` when a database URL is
//!    configured and reachable, in-memory otherwise
//! 4. Build the parking service and shared application state
//! 5. Serve until a shutdown signal arrives
//! 6. Drain the history writer and close the pool

mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parkwatch_core::broadcast::Broadcaster;
use parkwatch_core::config::ParkwatchConfig;
use parkwatch_core::store::OccupancyStore;
use parkwatch_core::{HistoryRecorder, MemoryHistory, ParkingService};
use parkwatch_db::{PostgresConfig, PostgresHistoryRecorder, PostgresPool};
use parkwatch_observer::{AppState, HistoryReader, ServerConfig};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Config file used when `PARKWATCH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "parkwatch-config.yaml";

/// How long shutdown waits for queued history records to be written.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The history backend chosen at startup.
struct HistoryBackend {
    recorder: Arc<dyn HistoryRecorder>,
    reader: HistoryReader,
    writer: Option<JoinHandle<()>>,
}

/// Application entry point for the Parkwatch server.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the server
/// fails to bind or serve.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration. Logging is not up yet, so note the source
    //    and report it once the subscriber exists.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!(
        source = %config_source,
        default_capacity = config.facility.default_capacity,
        host = %config.server.host,
        port = config.server.port,
        "parkwatch-server starting"
    );

    // 3. Select the history backend.
    let backend = connect_history(&config).await;
    info!(backend = backend.reader.backend(), "History backend selected");

    // 4. Build the parking service and shared state.
    let service = Arc::new(ParkingService::with_parts(
        OccupancyStore::new(config.facility.default_capacity),
        Broadcaster::with_buffer(config.broadcast.subscriber_buffer),
        backend.recorder,
    ));
    let state = Arc::new(AppState::new(service, backend.reader.clone()));

    // 5. Serve until shutdown.
    let server_config = ServerConfig::from(&config.server);
    let served = parkwatch_observer::start_server(
        &server_config,
        state,
        parkwatch_observer::shutdown_signal(),
    )
    .await;

    // 6. Drain the history writer and close the pool. Shutdown closes the
    //    open WebSocket subscriptions, which releases the last handle on the
    //    service and its recorder; the writer then drains and exits.
    if let Some(writer) = backend.writer {
        if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
            warn!("History writer did not drain before shutdown");
        }
    }
    if let HistoryReader::Postgres(pool) = &backend.reader {
        pool.close().await;
    }

    served?;
    info!("parkwatch-server shutdown complete");
    Ok(())
}

/// Load configuration from `$PARKWATCH_CONFIG` or the default path.
///
/// A missing file at the default path yields the built-in defaults, with
/// environment overrides still applied. A missing file named explicitly
/// through `PARKWATCH_CONFIG` is an error.
fn load_config() -> Result<(ParkwatchConfig, String), AppError> {
    if let Ok(path) = std::env::var("PARKWATCH_CONFIG") {
        let path = PathBuf::from(path);
        let config = ParkwatchConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = ParkwatchConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = ParkwatchConfig::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok((config, String::from("defaults")))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(config: &ParkwatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Connect to `PostgreSQL` when configured, falling back to in-memory
/// history if no URL is set or the database cannot be reached.
async fn connect_history(config: &ParkwatchConfig) -> HistoryBackend {
    let Some(pg_config) = PostgresConfig::from_settings(&config.database) else {
        info!("No database URL configured, keeping history in memory");
        return memory_backend(config);
    };

    let pool = match PostgresPool::connect(&pg_config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to PostgreSQL, keeping history in memory");
            return memory_backend(config);
        }
    };

    if config.database.run_migrations {
        if let Err(e) = pool.run_migrations().await {
            error!(error = %e, "Database migrations failed, keeping history in memory");
            pool.close().await;
            return memory_backend(config);
        }
    }

    let (recorder, writer) = PostgresHistoryRecorder::spawn(
        pool.pool().clone(),
        config.database.history_queue_capacity,
    );

    HistoryBackend {
        recorder: Arc::new(recorder),
        reader: HistoryReader::Postgres(pool),
        writer: Some(writer),
    }
}

fn memory_backend(config: &ParkwatchConfig) -> HistoryBackend {
    let history = Arc::new(MemoryHistory::new(config.history.memory_capacity));
    HistoryBackend {
        recorder: history.clone(),
        reader: HistoryReader::Memory(history),
        writer: None,
    }
}
