use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

mod config;
mod handlers;
mod notify;
mod printer;
mod sensor;

use runout_watch::{NotificationSink, PinLevel, PrinterControl, TripReactor, WatchHandle};

use crate::config::{FileConfig, load_config};
use crate::notify::{NullNotifier, WebhookNotifier};
use crate::printer::OctoPrinterControl;
use crate::sensor::SimulatedSensorPort;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Pauses an in-progress print when the filament sensor trips")]
struct Cli {
    /// Directory holding config.toml (defaults to the current directory)
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub watch: WatchHandle,
    pub sensor: Arc<SimulatedSensorPort>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let file_config: FileConfig = load_config(&cli.config_dir)
        .extract()
        .context("Failed to load configuration")?;
    let watch_config = file_config.watch_config();
    info!(
        pin = watch_config.pin,
        pause_inhibited = watch_config.pause_inhibited,
        "configuration loaded"
    );

    let sensor = Arc::new(SimulatedSensorPort::new(PinLevel::High));
    let printer: Arc<dyn PrinterControl> = Arc::new(OctoPrinterControl::new(
        file_config.printer.api_url.clone(),
        file_config.printer.api_key.clone(),
    ));
    let notifier: Arc<dyn NotificationSink> = match &file_config.notify.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => {
            if file_config.notify.enabled {
                warn!("notifications enabled but no webhook_url configured");
            }
            Arc::new(NullNotifier)
        }
    };

    let watch = TripReactor::spawn(watch_config, sensor.clone(), printer, notifier)
        .context("Failed to start the trip reactor")?;

    let state = AppState { watch, sensor };

    let app = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/plugin/filament/status", get(handlers::status_handler))
        .route("/plugin/filament/event", post(handlers::event_handler))
        .route("/plugin/filament/sensor", post(handlers::sensor_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let host = cli.host.unwrap_or_else(|| file_config.server.host.clone());
    let port = cli.port.unwrap_or(file_config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("Invalid listen address")?;

    info!("filament sentinel listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
