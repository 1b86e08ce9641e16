//! frontend-manager - frontend command dispatcher.
//!
//! Polls the frontend queue, dispatches every command of every envelope, and
//! acknowledges each batch once it has been fully processed.

use anyhow::Context as _;
use frontend_manager::config::{Config, LogFormat, validation};
use frontend_manager::consumer::Consumer;
use frontend_manager::handlers::Registry;
use frontend_manager::parameters::load_parameters;
use frontend_manager::processor::Processor;
use frontend_manager::publisher::Publisher;
use frontend_manager::supervisor::Supervisor;
use frontend_manager::transport::local::{LogBroker, SpoolQueue, StaticParameterStore};
use frontend_manager::{http, metrics};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "frontend-manager.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();
    let config = load_config()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.service.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        stage = %config.service.stage,
        local = config.service.local,
        "Starting frontend-manager"
    );

    // Remote queue, parameter store and broker clients are supplied by the
    // deployment integration; this binary only wires the local ones.
    if !config.service.local {
        error!("No remote transport is configured; set LOCAL=1 to run with local transports");
        anyhow::bail!("refusing to start without LOCAL");
    }

    // Startup parameters
    let store = StaticParameterStore::new(&config.parameters.values);
    let parameter_path = config.parameter_path();
    let parameters = load_parameters(&store, &parameter_path, config.parameters.page_size)
        .await
        .with_context(|| format!("failed to load parameters from {parameter_path}"))?;
    let queue_url = parameters.require(&config.parameters.required_key)?;
    info!(queue = %queue_url, "Frontend queue resolved");

    // Metrics + health
    metrics::init();
    if config.http.port != 0 {
        let port = config.http.port;
        tokio::spawn(async move {
            http::run_http_server(port, started).await;
        });
    }

    // Transports
    let queue = SpoolQueue::open(&config.local.spool_dir)
        .await
        .with_context(|| format!("failed to open spool directory {}", config.local.spool_dir))?;
    info!(dir = %config.local.spool_dir, "Local spool queue ready");
    let publisher = Arc::new(Publisher::new(
        config.service.stage.clone(),
        Arc::new(LogBroker),
    ));

    // Dispatch pipeline
    let registry = Arc::new(Registry::new());
    info!(commands = ?registry.names(), "Command registry built");
    let processor = Arc::new(Processor::new(registry, publisher));
    let consumer = Arc::new(Consumer::new(
        Arc::new(queue),
        processor,
        config.queue.max_messages,
        config.queue.wait_time(),
    ));
    let supervisor = Supervisor::new(consumer, config.restart.clone());

    let running = supervisor.run();
    tokio::pin!(running);

    tokio::select! {
        _ = &mut running => {
            warn!("Supervisor returned");
        }
        _ = shutdown_signal() => {
            let grace = config.shutdown.grace();
            info!(grace_ms = grace.as_millis() as u64, "Shutdown signal received, exiting after grace delay");
            let _ = tokio::time::timeout(grace, &mut running).await;
        }
    }

    info!("Stopped");
    Ok(())
}

/// First CLI argument, else the default file if present, else defaults.
/// Environment overrides apply in every case.
fn load_config() -> anyhow::Result<Config> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("failed to load config from {DEFAULT_CONFIG_PATH}"))?,
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install ctrl+c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
