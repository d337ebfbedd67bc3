#![forbid(unsafe_code)]

//! `clocktower` — MCP time server binary.
//!
//! Bootstraps configuration and tracing, then serves the HTTP/SSE MCP
//! transport until a shutdown signal arrives.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use clocktower::config::GlobalConfig;
use clocktower::mcp::handler::AppState;
use clocktower::mcp::session::SessionTable;
use clocktower::mcp::sse;
use clocktower::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "clocktower", about = "MCP time server over HTTP/SSE", version, long_about = None)]
struct Cli {
    /// Listen port override; defaults to the PORT environment variable.
    #[arg(long)]
    port: Option<u16>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("clocktower server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = GlobalConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    let config = Arc::new(config);
    info!(port = config.http_port, "configuration loaded");

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
    });
    let sessions = Arc::new(SessionTable::default());
    let ct = CancellationToken::new();

    let sse_ct = ct.clone();
    let sse_state = Arc::clone(&state);
    let sse_sessions = Arc::clone(&sessions);
    let sse_handle = tokio::spawn(async move {
        if let Err(err) = sse::serve_sse(sse_state, sse_sessions, sse_ct).await {
            error!(%err, "sse transport failed");
        }
    });

    info!("MCP server ready");

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = sse_handle.await;
    info!("clocktower shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
