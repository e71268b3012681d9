use anyhow::Context;
use clap::Parser;
use simplist::{
    Registry,
    config::{Config, StorageKind},
    net::{http, tcp},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

// cargo run -- --memory --addr 127.0.0.1:8000

#[derive(Debug, Parser)]
#[command(name = "simplist", version, about = "Realtime shared list server")]
struct Args {
    /// Address for the HTTP / WebSocket server (overrides HTTP_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// Read configuration from this TOML file instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep accounts and items in memory instead of Postgres
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(addr) = args.addr {
        cfg.http_addr = addr;
    }
    if args.memory {
        cfg.storage = StorageKind::Memory;
    }
    let cfg = Arc::new(cfg);

    let registry = Arc::new(Registry::from_config(cfg.clone()).await?);

    // HTTP (WebSocket) server
    let http_addr: SocketAddr = cfg
        .http_addr
        .parse()
        .with_context(|| format!("invalid http address '{}'", cfg.http_addr))?;
    let http_registry = registry.clone();
    let http_jh = tokio::spawn(async move {
        tracing::info!(%http_addr, "simplist HTTP (websocket) listening");
        if let Err(e) = http::serve(http_addr, http_registry).await {
            tracing::error!(error=%e, "HTTP server error");
        }
    });

    // Line protocol server, only when configured
    let tcp_jh = match &cfg.tcp_addr {
        Some(addr) => {
            let tcp_addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid tcp address '{addr}'"))?;
            let tcp_registry = registry.clone();
            tokio::spawn(async move {
                tracing::info!(%tcp_addr, "simplist TCP (line protocol) listening");
                if let Err(e) = tcp::serve(tcp_addr, tcp_registry).await {
                    tracing::error!(error=%e, "TCP server error");
                }
            })
        }
        None => tokio::spawn(std::future::pending::<()>()),
    };

    // Servers only end on error; stop as soon as one does
    let res = tokio::select! {
        r = http_jh => r,
        r = tcp_jh => r,
    };
    if let Err(e) = res {
        tracing::error!(error=%e, "server task failed");
    }

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!("{e}"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,simplist=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}
