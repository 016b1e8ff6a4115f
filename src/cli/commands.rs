//! CLI command implementations
//!
//! `serve` boot order: load config, open store, start the expiry sweep,
//! create queue, subscribe and spawn the projector, build the coordinator,
//! start the HTTP server. On shutdown the sweep stops, the queue is closed
//! and the projector drains before exit.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::args::{Cli, Command};
use super::config::{Config, StoreBackend};
use super::errors::{CliError, CliResult};
use crate::coordinator::PlanCoordinator;
use crate::http_server::{HttpServer, PlanState};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::projection::{spawn_projector, IndexProjector, ProjectionQueue, ProjectorStats};
use crate::search::{MemorySearchIndex, SearchFacade};
use crate::storage::{FileRecordStore, MemoryRecordStore, RecordStore};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
    }
}

/// Writes a default configuration file. Refuses to overwrite one.
pub fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path.display()));
    }
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CliError::io_error(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    let config = Config::default();
    let text = serde_json::to_string_pretty(&config)?;
    fs::write(config_path, text)?;

    write_response(json!({
        "initialized": true,
        "config": config_path.display().to_string(),
    }))
}

/// Boots every component and serves until the HTTP server stops.
pub fn serve(config_path: &Path) -> CliResult<()> {
    log_event(Event::BootStart, &[]);

    let config = Config::load(config_path)?;
    let path = config_path.display().to_string();
    log_event(Event::ConfigLoaded, &[("path", path.as_str())]);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let services = Services::boot(&config)?;
        let server = HttpServer::new(
            config.http.clone(),
            Arc::clone(&services.state),
            Arc::clone(&services.metrics),
        );
        let result = server
            .start()
            .await
            .map_err(|e| CliError::server_failed(format!("HTTP server failed: {}", e)));

        services.shutdown().await;
        result
    })
}

/// Every long-lived component of a running service.
pub struct Services {
    pub state: Arc<PlanState>,
    pub metrics: Arc<MetricsRegistry>,
    pub queue: Arc<ProjectionQueue>,
    pub search: Arc<MemorySearchIndex>,
    projector: JoinHandle<ProjectorStats>,
    sweeper: Option<JoinHandle<()>>,
}

impl Services {
    /// Wires the store, queue, projector and coordinator.
    ///
    /// Must run inside a tokio runtime; the projector is spawned onto it.
    pub fn boot(config: &Config) -> CliResult<Self> {
        let metrics = Arc::new(MetricsRegistry::new());
        let store = open_store(config)?;
        let sweeper = config
            .purge_interval()
            .map(|every| spawn_expiry_sweep(Arc::clone(&store), every, Arc::clone(&metrics)));

        let search = Arc::new(MemorySearchIndex::new());
        search
            .create_index(&config.index_name)
            .map_err(|e| CliError::boot_failed(format!("Failed to create index: {}", e)))?;

        let queue = Arc::new(ProjectionQueue::new(
            config.queue_name.clone(),
            config.queue_capacity,
        ));
        let consumer = format!("index-projector-{}", Uuid::new_v4());
        let projector = spawn_projector(
            queue.subscribe(consumer),
            IndexProjector::new(
                Arc::clone(&search) as Arc<dyn SearchFacade>,
                config.index_name.clone(),
                Arc::clone(&metrics),
            ),
        );

        let coordinator = PlanCoordinator::new(store, Arc::clone(&metrics))
            .with_queue(Arc::clone(&queue))
            .with_ttl(config.record_ttl());

        let state = Arc::new(PlanState {
            coordinator: Arc::new(coordinator),
            search: Arc::clone(&search) as Arc<dyn SearchFacade>,
            index_name: config.index_name.clone(),
        });

        Ok(Self {
            state,
            metrics,
            queue,
            search,
            projector,
            sweeper,
        })
    }

    /// Closes the queue and waits for the projector to drain it.
    pub async fn shutdown(self) -> ProjectorStats {
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
        self.queue.close();
        let stats = self.projector.await.unwrap_or_default();
        log_event(Event::ShutdownComplete, &[]);
        stats
    }
}

fn open_store(config: &Config) -> CliResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
        StoreBackend::File => {
            let store = FileRecordStore::open(config.data_path()).map_err(|e| {
                CliError::boot_failed(format!(
                    "Failed to open store at {}: {}",
                    config.store.data_dir, e
                ))
            })?;
            Arc::new(store)
        }
    };

    let backend = match config.store.backend {
        StoreBackend::Memory => "memory",
        StoreBackend::File => "file",
    };
    log_event(
        Event::StoreOpened,
        &[("backend", backend), ("data_dir", config.store.data_dir.as_str())],
    );
    Ok(store)
}

/// Periodically reclaims expired records on the blocking pool.
pub fn spawn_expiry_sweep(
    store: Arc<dyn RecordStore>,
    every: Duration,
    metrics: Arc<MetricsRegistry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let store = Arc::clone(&store);
            let purged = tokio::task::spawn_blocking(move || store.purge_expired())
                .await
                .map_err(|e| e.to_string())
                .and_then(|result| result.map_err(|e| e.to_string()));

            match purged {
                Ok(0) => {}
                Ok(purged) => {
                    metrics.add_records_purged(purged as u64);
                    let purged = purged.to_string();
                    log_event(Event::RecordsPurged, &[("records", purged.as_str())]);
                }
                Err(error) => log_event(
                    Event::StoreFailure,
                    &[("error", error.as_str()), ("operation", "purge_expired")],
                ),
            }
        }
    })
}

fn write_response(data: Value) -> CliResult<()> {
    let response = json!({ "status": "ok", "data": data });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
