//! InfluxDB 2.x sink.
//!
//! The whole run produces one batch, written in a single call. There is no
//! buffering across runs and no retry: a failed write fails the run and no
//! points from it persist.

use futures::stream;
use influxdb2::Client;
use tracing::info;

use crate::config::InfluxConfig;
use crate::error::{CollectorError, Result};
use crate::point::MetricPoint;

/// Write-only InfluxDB client bound to one bucket
pub struct InfluxWriter {
    client: Client,
    bucket: String,
}

impl InfluxWriter {
    /// Create a writer for the configured server and bucket.
    pub fn new(config: &InfluxConfig) -> Self {
        // the client concatenates paths onto this, so no trailing slash
        let url = config.url.as_str().trim_end_matches('/');
        let client = Client::new(url, &config.org, &config.token);
        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }

    /// Write the run's batch in one call, preserving point order.
    ///
    /// An empty batch skips the HTTP request entirely; the server rejects
    /// empty write bodies.
    pub async fn write_batch(&self, points: Vec<MetricPoint>) -> Result<()> {
        if points.is_empty() {
            info!("no points produced, skipping write");
            return Ok(());
        }

        let count = points.len();
        let data_points = points
            .into_iter()
            .map(MetricPoint::into_data_point)
            .collect::<Result<Vec<_>>>()?;

        self.client
            .write(&self.bucket, stream::iter(data_points))
            .await
            .map_err(|e| CollectorError::InfluxWrite(e.to_string()))?;

        info!("wrote {count} points to bucket {:?}", self.bucket);
        Ok(())
    }
}
