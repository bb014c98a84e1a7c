//! Homematic IP ingestion.
//!
//! The REST API answers one `getCurrentState` call with the whole home:
//! groups, devices and their channel readings. Rooms are the groups typed
//! `"META"`. Requests authenticate with two headers, the issued AUTHTOKEN and
//! a CLIENTAUTH value derived from the access point id. When no endpoint is
//! configured the public lookup service resolves the access point to its REST
//! host first.

pub mod model;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha512};
use tracing::{debug, info};
use url::Url;

use crate::classify::classify;
use crate::config::{HmipConfig, Settings};
use crate::error::{CollectorError, Result};
use crate::influx::InfluxWriter;
use model::CurrentState;

/// Public service resolving an access point id to its REST endpoint
pub const DEFAULT_LOOKUP_URL: &str = "https://lookup.homematic.com:48335/getHost";

/// Fixed salt the REST API expects in the CLIENTAUTH derivation
const CLIENTAUTH_SALT: &str = "jiLpVitHvWnIGD1yo7MA";

fn normalize_access_point(access_point: &str) -> String {
    access_point.replace('-', "").to_uppercase()
}

/// CLIENTAUTH header value: uppercase hex SHA-512 over the normalized access
/// point id concatenated with the fixed salt.
fn clientauth_token(access_point: &str) -> String {
    let normalized = normalize_access_point(access_point);
    let digest = Sha512::digest(format!("{normalized}{CLIENTAUTH_SALT}").as_bytes());
    hex::encode_upper(digest)
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "urlREST")]
    url_rest: Url,
}

/// HTTP client for the Homematic IP REST API
pub struct HmipClient {
    client: Client,
    explicit_url: Option<Url>,
    lookup_url: Option<Url>,
    request_body: serde_json::Value,
}

impl HmipClient {
    /// Create a client carrying the auth headers on every request.
    pub fn new(config: &HmipConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("VERSION", HeaderValue::from_static("12"));

        let mut auth_token = HeaderValue::from_str(&config.auth_token)
            .map_err(|e| CollectorError::config(format!("invalid auth token: {e}")))?;
        auth_token.set_sensitive(true);
        headers.insert("AUTHTOKEN", auth_token);

        let mut clientauth = HeaderValue::from_str(&clientauth_token(&config.access_point))
            .map_err(|e| CollectorError::config(format!("invalid access point id: {e}")))?;
        clientauth.set_sensitive(true);
        headers.insert("CLIENTAUTH", clientauth);

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("homematic-influx/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                CollectorError::connection(format!("failed to build HTTP client: {e}"))
            })?;

        let request_body = json!({
            "clientCharacteristics": {
                "apiVersion": "10",
                "applicationIdentifier": "homematic-influx",
                "applicationVersion": env!("CARGO_PKG_VERSION"),
            },
            "id": normalize_access_point(&config.access_point),
        });

        Ok(Self {
            client,
            explicit_url: config.url.clone(),
            lookup_url: config.lookup_url.clone(),
            request_body,
        })
    }

    /// The REST endpoint: the configured one, or whatever the lookup service
    /// resolves the access point to.
    async fn resolve_rest_url(&self) -> Result<Url> {
        if let Some(url) = &self.explicit_url {
            return Ok(url.clone());
        }

        let lookup_url = match &self.lookup_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_LOOKUP_URL)
                .map_err(|e| CollectorError::config(format!("invalid lookup URL: {e}")))?,
        };

        debug!("resolving REST host via {lookup_url}");
        let response = self
            .client
            .post(lookup_url)
            .json(&self.request_body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::connection(format!(
                "lookup service returned HTTP {status}"
            )));
        }

        let lookup: LookupResponse = serde_json::from_str(&response.text().await?)?;
        info!("access point resolved to {}", lookup.url_rest);
        Ok(lookup.url_rest)
    }

    /// Fetch the full current state of the home.
    pub async fn fetch_current_state(&self) -> Result<CurrentState> {
        let rest_url = self.resolve_rest_url().await?;
        let url = rest_url
            .join("hmip/home/getCurrentState")
            .map_err(|e| CollectorError::connection(format!("invalid REST URL: {e}")))?;

        debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .json(&self.request_body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::connection(format!(
                "getCurrentState returned HTTP {status}"
            )));
        }

        Ok(serde_json::from_str(&response.text().await?)?)
    }
}

/// Execute one full collection run against the Homematic IP API: fetch the
/// current state, snapshot every META-grouped device, classify, and write the
/// resulting batch. Returns the number of points written.
pub async fn run(settings: &Settings) -> Result<usize> {
    let client = HmipClient::new(settings.homematicip()?)?;
    let state = client.fetch_current_state().await?;
    info!(
        "current state carries {} groups and {} devices",
        state.groups.len(),
        state.devices.len()
    );

    let snapshots = state.meta_group_snapshots()?;
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
