//! OP25 Bridge server binary.
//!
//! Reads receiver messages from stdin, writes forwarded commands to stdout
//! and serves the SSE stream, command endpoint and terminal assets over HTTP.
//! Logs go to stderr so stdout stays a clean command stream.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use op25_bridge::adapters::stdio::{pump_lines, write_commands};
use op25_bridge::adapters::{BoundedQueue, FilesystemAssets};
use op25_bridge::application::{BridgeContext, BridgeSettings};
use op25_bridge::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use op25_bridge::domain::{Command, Envelope};

/// Upper bound on waiting for blocking tasks (stdin reads) at exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> Result<(), ServerError> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run());
    // A pending stdin read parks a blocking thread that never returns.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run() -> Result<(), ServerError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let addr = config.server.socket_addr()?;
    let poll_interval = config.bridge.poll_interval();

    let inbound = Arc::new(BoundedQueue::<Envelope>::new(config.bridge.inbound_capacity));
    let commands = Arc::new(BoundedQueue::<Command>::new(config.bridge.command_capacity));
    let assets = Arc::new(FilesystemAssets::new(
        &config.assets.static_dir,
        &config.assets.image_dir,
    ));

    let mut ctx = BridgeContext::new(
        BridgeSettings::from(&config),
        inbound.clone(),
        commands.clone(),
        assets,
    );
    let token = ctx.shutdown_token();
    let watcher = ctx.spawn_watcher();
    let ctx = Arc::new(ctx);

    let feed = tokio::spawn(pump_lines(
        BufReader::new(tokio::io::stdin()),
        inbound,
        poll_interval,
        token.clone(),
    ));
    let writer = tokio::spawn(write_commands(
        commands,
        tokio::io::stdout(),
        poll_interval,
        token.clone(),
    ));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "OP25 bridge listening");

    let shutdown_ctx = Arc::clone(&ctx);
    axum::serve(listener, ctx.router())
        .with_graceful_shutdown(async move {
            if let Err(e) = wait_for_shutdown_signal().await {
                tracing::error!("Failed to install signal handlers: {}", e);
            }
            tracing::info!("Shutdown signal received");
            // SSE streams only end once their sinks are closed.
            shutdown_ctx.shutdown();
        })
        .await?;

    ctx.shutdown();

    if let Some(watcher) = watcher {
        match watcher.await {
            Ok(reason) => tracing::info!(%reason, "Queue watcher stopped"),
            Err(e) => tracing::error!("Queue watcher task failed: {}", e),
        }
    }
    match writer.await {
        Ok(Ok(written)) => tracing::debug!(written, "Command writer finished"),
        Ok(Err(e)) => tracing::warn!("Command writer failed: {}", e),
        Err(e) => tracing::error!("Command writer task failed: {}", e),
    }
    feed.abort();

    tracing::info!("OP25 bridge stopped");
    Ok(())
}

/// Initialise tracing: `RUST_LOG` wins over the configured filter; JSON
/// output in production.
fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
