//! CCU XML-API collector entry point.
//!
//! One invocation performs one collection run: poll the CCU, classify every
//! mapped device, write the batch, exit. Scheduling is external (cron or a
//! systemd timer); there are no CLI flags, everything comes from the
//! configuration file and environment.

use homematic_influx::config::Settings;
use homematic_influx::{xmlapi, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_logging();

    info!("homematic-influx v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = Settings::new()?;
    let written = xmlapi::run(&settings).await?;

    info!("run complete, {written} points written");
    Ok(())
}
