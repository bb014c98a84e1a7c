//! CCU XML-API ingestion.
//!
//! One run fetches the room list, the device list, and then the state of
//! every device that resolves to a room. Devices without a mapped room are
//! dropped before any state request goes out. State fetches run concurrently
//! up to `max_in_flight`, yielding results in device-list order.

pub mod parse;

use std::collections::HashMap;

use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, info};
use url::Url;

use crate::classify::{classify, DeviceSnapshot};
use crate::config::{CcuConfig, Settings};
use crate::decode::DatapointValue;
use crate::error::{CollectorError, Result};
use crate::influx::InfluxWriter;
use parse::{DeviceEntry, RoomIndex};

/// HTTP client for the CCU XML-API addon
pub struct XmlApiClient {
    client: Client,
    base_url: Url,
    max_in_flight: usize,
}

impl XmlApiClient {
    /// Create a new client for the configured CCU.
    pub fn new(config: &CcuConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("homematic-influx/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CollectorError::connection(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.ccu_url.clone(),
            max_in_flight: config.max_in_flight.max(1),
        })
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CollectorError::connection(format!("invalid URL path {path}: {e}")))
    }

    fn state_url(&self, device_id: &str) -> Result<Url> {
        let mut url = self.build_url("config/xmlapi/state.cgi")?;
        url.query_pairs_mut().append_pair("device_id", device_id);
        Ok(url)
    }

    async fn fetch_text(&self, url: Url) -> Result<String> {
        debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::connection(format!(
                "{url} returned HTTP {status}"
            )));
        }
        Ok(response.text().await?)
    }

    /// Fetch and parse `roomlist.cgi`.
    pub async fn fetch_room_index(&self) -> Result<RoomIndex> {
        let url = self.build_url("config/xmlapi/roomlist.cgi")?;
        let index = parse::parse_room_list(&self.fetch_text(url).await?)?;
        info!("room index maps {} channels", index.len());
        Ok(index)
    }

    /// Fetch and parse `devicelist.cgi`.
    pub async fn fetch_device_list(&self) -> Result<Vec<DeviceEntry>> {
        let url = self.build_url("config/xmlapi/devicelist.cgi")?;
        let devices = parse::parse_device_list(&self.fetch_text(url).await?)?;
        info!("controller lists {} devices", devices.len());
        Ok(devices)
    }

    /// Fetch and decode `state.cgi` for one device.
    pub async fn fetch_device_state(
        &self,
        device_id: &str,
    ) -> Result<HashMap<String, DatapointValue>> {
        let url = self.state_url(device_id)?;
        parse::parse_device_state(&self.fetch_text(url).await?)
    }

    /// Produce one snapshot per room-resolved device, in device-list order.
    pub async fn collect_snapshots(&self) -> Result<Vec<DeviceSnapshot>> {
        let rooms = self.fetch_room_index().await?;
        let devices = self.fetch_device_list().await?;
        let total = devices.len();

        let mapped: Vec<(DeviceEntry, String)> = devices
            .into_iter()
            .filter_map(|device| match device.resolve_room(&rooms) {
                Some(room) => {
                    let room = room.to_string();
                    Some((device, room))
                }
                None => {
                    debug!(device = device.name.as_str(), "no mapped room, skipping");
                    None
                }
            })
            .collect();

        info!(
            "fetching state for {} of {} devices ({} in flight)",
            mapped.len(),
            total,
            self.max_in_flight
        );

        stream::iter(mapped.into_iter().map(|(device, room)| async move {
            let datapoints = self.fetch_device_state(&device.ise_id).await?;
            Ok::<_, CollectorError>(DeviceSnapshot {
                name: device.name,
                device_type: device.device_type,
                room,
                datapoints,
            })
        }))
        .buffered(self.max_in_flight)
        .try_collect()
        .await
    }
}

/// Execute one full collection run against the CCU: snapshot every mapped
/// device, classify, and write the resulting batch. Returns the number of
/// points written.
pub async fn run(settings: &Settings) -> Result<usize> {
    let client = XmlApiClient::new(settings.homematic()?)?;
    let snapshots = client.collect_snapshots().await?;

    let mut points = Vec::new();
    for snapshot in &snapshots {
        if let Some(point) = classify(snapshot)? {
            points.push(point);
        }
    }
    info!(
        "classified {} points from {} device snapshots",
        points.len(),
        snapshots.len()
    );

    let written = points.len();
    InfluxWriter::new(&settings.influxdb)
        .write_batch(points)
        .await?;
    Ok(written)
}
