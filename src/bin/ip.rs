//! Homematic IP collector entry point.
//!
//! Same one-run contract as the CCU binary, but against the Homematic IP
//! REST API: fetch the full current state, classify every META-grouped
//! device, write the batch, exit.

use homematic_influx::config::Settings;
use homematic_influx::{hmip, Result};
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

    info!("homematic-influx-ip v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = Settings::new()?;
    let written = hmip::run(&settings).await?;

    info!("run complete, {written} points written");
    Ok(())
}
