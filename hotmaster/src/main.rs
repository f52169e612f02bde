//! hotmaster - Main entry point
//!
//! Multi-reference mastering service: upload a target and up to ten
//! references, audition aligned previews, vote hot-or-not, download masters.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hotmaster::engine::{EngineConfig, WavEngine};
use hotmaster::{build_router, AppState};
use hotmaster_common::config::{
    default_config_path, load_toml_config, resolve_data_folder, DataFolders,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 8360;

/// Command-line arguments for hotmaster
#[derive(Parser, Debug)]
#[command(name = "hotmaster")]
#[command(about = "Multi-reference mastering with hot-or-not voting")]
#[command(version)]
struct Args {
    /// Port to listen on (falls back to the config file, then 8360)
    #[arg(short, long, env = "HOTMASTER_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0", env = "HOTMASTER_BIND")]
    bind: String,

    /// Folder holding uploads, results and previews
    #[arg(short, long, env = "HOTMASTER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to hotmaster.toml
    #[arg(short, long, env = "HOTMASTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let toml_config = load_toml_config(&config_path).context("Failed to load configuration")?;

    // RUST_LOG wins over the config file
    let level = toml_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hotmaster={0},hotmaster_common={0},tower_http={0}", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    info!("Starting hotmaster on port {}", port);
    info!("Config file: {}", config_path.display());

    let data_dir = resolve_data_folder(args.data_dir.as_deref(), &toml_config);
    let folders = DataFolders::new(data_dir);
    folders
        .ensure_exists()
        .context("Failed to create data folders")?;
    info!("Data folder: {}", folders.root.display());

    let engine_config = EngineConfig::from_settings(&toml_config.engine, &toml_config.preview);
    info!(
        sample_rate = engine_config.internal_sample_rate,
        preview_frames = engine_config.preview_size,
        "Engine configured"
    );

    let state = AppState::new(Arc::new(WavEngine::new()), engine_config, folders);
    let app = build_router(state);

    let ip: std::net::IpAddr = args
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", args.bind))?;
    let addr = SocketAddr::new(ip, port);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
