//! # homercd — homerc daemon
//!
//! Composition root that wires the directory, drivers and HTTP adapter
//! together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Initialise the resource directory and declare the configured hosts
//! - Install the enabled integrations (drivers and their resources)
//! - Start the background garbage collection
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use homerc_adapter_http_axum::state::AppState;
use homerc_adapter_virtual::VirtualIntegration;
use homerc_app::{Directory, DirectoryConfig, spawn_gc};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Directory
    let directory = Directory::init(DirectoryConfig {
        host_id: config.directory.host_id.clone(),
        address: config.directory.address.clone(),
    })?;
    for host in &config.hosts {
        directory.add_host(&host.id, host.address.clone())?;
    }

    // Integrations
    let integration = config
        .integrations
        .virtual_enabled
        .then(|| VirtualIntegration::new(config.shades_travel()));
    if let Some(integration) = &integration {
        integration.install(&directory)?;
    }

    let gc = spawn_gc(directory.clone(), config.gc_interval());

    // HTTP
    let app = homerc_adapter_http_axum::router::build(AppState::new(directory.clone()));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, host = directory.local_host(), "homercd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    gc.stop().await;
    directory.done();
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
