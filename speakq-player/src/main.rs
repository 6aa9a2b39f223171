//! speakq - Main entry point
//!
//! Drives a speech controller backed by the simulated engine. Control
//! requests arrive as JSON lines on stdin (`{"action": "...", "payload": {...}}`);
//! request outcomes and broadcast events are written as JSON lines to stdout.
//! Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use speakq_common::events::{EventBus, SpeakqEvent};
use speakq_player::actions::{handle_request, ActionRequest, ActionResponse};
use speakq_player::config::PlayerConfig;
use speakq_player::engine::{SimulatedEngine, SpeechEngine};
use speakq_player::{Controller, ControllerHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for speakq
#[derive(Parser, Debug)]
#[command(name = "speakq")]
#[command(about = "Sequential speech playback controller")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Make the simulated engine silently ignore pause requests
    #[arg(long, env = "SPEAKQ_NO_PAUSE_SUPPORT")]
    no_pause_support: bool,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, env = "SPEAKQ_LOG_LEVEL")]
    log_level: Option<String>,

    /// Delay before the simulated engine publishes its voice catalog
    #[arg(long)]
    catalog_delay_ms: Option<u64>,

    /// Exit as soon as stdin closes instead of waiting for a signal
    #[arg(long)]
    exit_on_eof: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let mut config =
        PlayerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if args.no_pause_support {
        config.engine.supports_pause = false;
    }
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("speakq_player={level},speakq={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting speakq v{}", env!("CARGO_PKG_VERSION"));
    debug!("Configuration: {:?}", config);

    let bus = EventBus::new(config.event_capacity);
    let printer = tokio::spawn(print_events(bus.subscribe()));

    let mut engine = SimulatedEngine::new(&config.engine);
    if let Some(ms) = args.catalog_delay_ms {
        engine = engine.with_catalog_delay(Duration::from_millis(ms));
    }
    let engine: Arc<dyn SpeechEngine> = Arc::new(engine);

    let controller = Controller::spawn(engine, config.timing.clone(), bus)
        .context("Failed to start speech controller")?;
    info!("Controller ready; reading requests from stdin");

    tokio::select! {
        result = read_requests(&controller) => {
            result.context("Failed to read stdin")?;
            if !args.exit_on_eof {
                info!("stdin closed; waiting for shutdown signal");
                shutdown_signal().await;
            }
        }
        _ = shutdown_signal() => {}
    }

    controller.shutdown();
    // Let the final status notification drain before exiting
    tokio::time::sleep(config.timing.status_quiet_period() * 2).await;
    printer.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Handle JSON-line requests until stdin closes
async fn read_requests(controller: &ControllerHandle) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ActionRequest>(line) {
            Ok(request) => handle_request(request, controller).await,
            Err(e) => {
                warn!("Malformed request: {}", e);
                ActionResponse::Error {
                    action: String::new(),
                    error: format!("Malformed request: {e}"),
                }
            }
        };
        print_json(&response);
    }

    Ok(())
}

/// Write every broadcast event to stdout
async fn print_events(mut rx: tokio::sync::broadcast::Receiver<SpeakqEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                debug!("Broadcasting {} event", event.name());
                print_json(&event);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, skipped {} events", skipped);
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!("Failed to serialize output: {}", e),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
