//! RaceTicker Service Daemon (tickerd)

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use raceticker_service::{AppContext, Poller, router};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "tickerd", about = "RaceTicker scrolling sign daemon")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Override the bind address from the config file
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                concat!(
                    "raceticker_config=debug,raceticker_feed=debug,raceticker_clock=debug,",
                    "raceticker_format=debug,raceticker_display=debug,raceticker_service=debug,",
                    "info",
                )
                .into()
            }),
        )
        .init();

    let args = Args::parse();
    info!("starting RaceTicker service v{}", env!("CARGO_PKG_VERSION"));

    let context = AppContext::bootstrap(&args.config)?;
    let snapshot = context.config.snapshot();

    let poller = Poller::new(
        context.config.clone(),
        context.fetch.clone(),
        context.display.clone(),
        context.clock.clone(),
    )?;
    tokio::spawn(poller.run());

    let listener = match args.bind {
        Some(addr) => tokio::net::TcpListener::bind(addr).await,
        None => {
            tokio::net::TcpListener::bind((snapshot.app.host.as_str(), snapshot.app.port)).await
        }
    }
    .context("failed to bind HTTP listener")?;
    info!(
        addr = %listener.local_addr().context("listener has no local address")?,
        "HTTP server listening"
    );

    axum::serve(listener, router(context))
        .await
        .context("HTTP server error")?;
    Ok(())
}
