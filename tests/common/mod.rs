//! WireMock-based controller and sink mocks shared by the pipeline tests.

use std::time::Duration;

use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homematic_influx::config::{CcuConfig, HmipConfig, InfluxConfig, Settings};

/// Mock CCU serving the three XML-API endpoints
pub struct MockCcu {
    pub server: MockServer,
}

#[allow(dead_code)]
impl MockCcu {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub async fn mock_room_list(&self, xml: &str) {
        Mock::given(method("GET"))
            .and(path("/config/xmlapi/roomlist.cgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(xml.to_string()))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_device_list(&self, xml: &str) {
        Mock::given(method("GET"))
            .and(path("/config/xmlapi/devicelist.cgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(xml.to_string()))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_device_list_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/config/xmlapi/devicelist.cgi"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_device_state(&self, device_id: &str, xml: &str) {
        Mock::given(method("GET"))
            .and(path("/config/xmlapi/state.cgi"))
            .and(query_param("device_id", device_id))
            .respond_with(ResponseTemplate::new(200).set_body_string(xml.to_string()))
            .mount(&self.server)
            .await;
    }

    /// Mount a state endpoint that must never be hit; verified when the
    /// server drops.
    pub async fn mock_device_state_never(&self, device_id: &str) {
        Mock::given(method("GET"))
            .and(path("/config/xmlapi/state.cgi"))
            .and(query_param("device_id", device_id))
            .respond_with(ResponseTemplate::new(200).set_body_string("<state/>"))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

/// Mock InfluxDB 2.x accepting v2 write calls
pub struct MockInflux {
    pub server: MockServer,
}

#[allow(dead_code)]
impl MockInflux {
    /// Start the mock with a write endpoint for the given org and bucket.
    pub async fn start(org: &str, bucket: &str) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .and(query_param("org", org))
            .and(query_param("bucket", bucket))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Bodies of all write calls received so far, in arrival order.
    pub async fn write_bodies(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/api/v2/write")
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
            .collect()
    }

    /// Authorization header values of all write calls received so far.
    pub async fn write_auth_headers(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/api/v2/write")
            .filter_map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }
}

#[allow(dead_code)]
pub fn ccu_settings(ccu_url: &str, influx_url: &str) -> Settings {
    Settings {
        homematic: Some(CcuConfig {
            ccu_url: Url::parse(ccu_url).unwrap(),
            timeout: Duration::from_secs(5),
            max_in_flight: 4,
        }),
        homematicip: None,
        influxdb: influx_config(influx_url),
    }
}

#[allow(dead_code)]
pub fn hmip_settings(
    api_url: Option<&str>,
    lookup_url: Option<&str>,
    influx_url: &str,
) -> Settings {
    Settings {
        homematic: None,
        homematicip: Some(HmipConfig {
            access_point: "3014-F711-A000-0000-0000-0000".to_string(),
            auth_token: "test-auth-token".to_string(),
            url: api_url.map(|u| Url::parse(u).unwrap()),
            lookup_url: lookup_url.map(|u| Url::parse(u).unwrap()),
            timeout: Duration::from_secs(5),
        }),
        influxdb: influx_config(influx_url),
    }
}

fn influx_config(url: &str) -> InfluxConfig {
    InfluxConfig {
        url: Url::parse(url).unwrap(),
        token: "test-token".to_string(),
        org: "home".to_string(),
        bucket: "homematic".to_string(),
    }
}
