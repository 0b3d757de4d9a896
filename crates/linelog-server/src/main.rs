use clap::Parser;
use linelog_logging::LinelogSubscriberBuilder;
use linelog_server::{Cli, LinelogServer, shutdown_signal};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    let _log_guard = LinelogSubscriberBuilder::new()
        .with_config(config.log.clone())
        .init();

    let server = LinelogServer::bind(&config).await?;

    let stop = server.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Caught signal, exiting");
        stop.cancel();
    });

    let report = server.run().await?;
    info!(
        connections = report.connections_served,
        records_released = report.teardown.map(|t| t.records_released),
        "Exiting linelog-server"
    );

    Ok(())
}
