use anyhow::Context;
use clap::Parser;
use tracing::info;

use pfw::cli::Cli;
use pfw::logging::{self, LogLevel};
use pfw::supervisor::ServiceSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let debug = cli.debug;

    let config = cli.into_config().context("failed to load configuration")?;
    logging::init(LogLevel::from_config(config.global.loglevel.as_deref(), debug));

    let services = config.resolved_services();
    info!(services = services.len(), "starting port forwarder");

    let mut supervisor = ServiceSupervisor::new();
    supervisor.start_all(&services).await;
    supervisor.wait().await;

    Ok(())
}
