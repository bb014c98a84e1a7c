//! End-to-end tests for the Homematic IP collection run, against mock
//! lookup, REST and sink servers.

mod common;

use common::{hmip_settings, MockInflux};
use homematic_influx::{hmip, CollectorError};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `3014-F711-A000-0000-0000-0000` with separators stripped
const NORMALIZED_ACCESS_POINT: &str = "3014F711A000000000000000";

const CURRENT_STATE: &str = r#"{
    "groups": {
        "g1": {
            "id": "g1",
            "type": "META",
            "label": "Kitchen",
            "channels": [
                {"deviceId": "d-window", "channelIndex": 0},
                {"deviceId": "d-plug", "channelIndex": 0}
            ]
        },
        "g2": {
            "id": "g2",
            "type": "META",
            "label": "Bathroom",
            "channels": [
                {"deviceId": "d-etrv", "channelIndex": 0}
            ]
        },
        "g9": {
            "id": "g9",
            "type": "HEATING",
            "label": "Bathroom heating",
            "channels": [
                {"deviceId": "d-etrv", "channelIndex": 1}
            ]
        }
    },
    "devices": {
        "d-window": {
            "id": "d-window",
            "type": "SHUTTER_CONTACT",
            "label": "window-kitchen",
            "functionalChannels": {
                "0": {
                    "functionalChannelType": "DEVICE_BASE",
                    "rssiDeviceValue": -60,
                    "lowBat": false,
                    "unreach": false
                },
                "1": {
                    "functionalChannelType": "SHUTTER_CONTACT_CHANNEL",
                    "windowState": "OPEN"
                }
            }
        },
        "d-etrv": {
            "id": "d-etrv",
            "type": "HEATING_THERMOSTAT",
            "label": "etrv-bath",
            "functionalChannels": {
                "0": {
                    "functionalChannelType": "DEVICE_BASE",
                    "rssiDeviceValue": -71,
                    "lowBat": true,
                    "unreach": false
                },
                "1": {
                    "functionalChannelType": "HEATING_THERMOSTAT_CHANNEL",
                    "valveActualTemperature": 21.5,
                    "setPointTemperature": 17.5,
                    "valvePosition": 0.35
                }
            }
        },
        "d-plug": {
            "id": "d-plug",
            "type": "PLUGABLE_SWITCH",
            "label": "plug-kitchen",
            "functionalChannels": {
                "0": {
                    "functionalChannelType": "DEVICE_BASE",
                    "rssiDeviceValue": -55,
                    "lowBat": null,
                    "unreach": false
                }
            }
        }
    }
}"#;

async fn mock_current_state(api: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/hmip/home/getCurrentState"))
        .and(header("AUTHTOKEN", "test-auth-token"))
        .and(header("VERSION", "12"))
        .and(header_exists("CLIENTAUTH"))
        .and(body_partial_json(json!({"id": NORMALIZED_ACCESS_POINT})))
        .respond_with(ResponseTemplate::new(200).set_body_string(CURRENT_STATE))
        .expect(1)
        .mount(api)
        .await;
}

fn assert_batch(body: &str) {
    let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 2, "body: {body}");

    // META groups in id order, the plug carries no schema
    let window = lines[0];
    assert!(window.starts_with("window,"), "{window}");
    assert!(window.contains("room=Kitchen"), "{window}");
    assert!(window.contains("device=window-kitchen"), "{window}");
    assert!(window.contains("state=t"), "{window}");
    assert!(window.contains("rssi=-60i"), "{window}");

    let thermostat = lines[1];
    assert!(thermostat.starts_with("thermostat,"), "{thermostat}");
    assert!(thermostat.contains("room=Bathroom"), "{thermostat}");
    assert!(thermostat.contains("device=etrv-bath"), "{thermostat}");
    assert!(thermostat.contains("temperature=21.5"), "{thermostat}");
    assert!(thermostat.contains("target_temperature=17.5"), "{thermostat}");
    assert!(thermostat.contains("valve_position=0.35"), "{thermostat}");
    assert!(thermostat.contains("rssi=-71i"), "{thermostat}");
    assert!(thermostat.contains("lowbat=t"), "{thermostat}");

    for line in &lines {
        assert_eq!(line.split(' ').count(), 2, "unexpected timestamp in {line}");
    }
}

#[tokio::test]
async fn explicit_endpoint_skips_the_lookup() {
    let api = MockServer::start().await;
    let influx = MockInflux::start("home", "homematic").await;
    mock_current_state(&api).await;

    let settings = hmip_settings(Some(&api.uri()), None, &influx.url());
    let written = hmip::run(&settings).await.unwrap();
    assert_eq!(written, 2);

    let bodies = influx.write_bodies().await;
    assert_eq!(bodies.len(), 1, "expected exactly one batched write");
    assert_batch(&bodies[0]);

    assert_eq!(
        influx.write_auth_headers().await,
        vec!["Token test-token".to_string()]
    );

    // the CLIENTAUTH digest is opaque here, but its shape is not
    let requests = api.received_requests().await.unwrap_or_default();
    let clientauth = requests[0]
        .headers
        .get("CLIENTAUTH")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(clientauth.len(), 128);
    assert!(clientauth
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}

#[tokio::test]
async fn lookup_resolves_the_rest_host_first() {
    let lookup = MockServer::start().await;
    let api = MockServer::start().await;
    let influx = MockInflux::start("home", "homematic").await;

    Mock::given(method("POST"))
        .and(path("/getHost"))
        .and(header("AUTHTOKEN", "test-auth-token"))
        .and(header_exists("CLIENTAUTH"))
        .and(body_partial_json(json!({"id": NORMALIZED_ACCESS_POINT})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"urlREST": api.uri()})))
        .expect(1)
        .mount(&lookup)
        .await;
    mock_current_state(&api).await;

    let lookup_url = format!("{}/getHost", lookup.uri());
    let settings = hmip_settings(None, Some(&lookup_url), &influx.url());
    let written = hmip::run(&settings).await.unwrap();
    assert_eq!(written, 2);

    assert_batch(&influx.write_bodies().await[0]);
}

#[tokio::test]
async fn lookup_failure_aborts_the_run() {
    let lookup = MockServer::start().await;
    let influx = MockInflux::start("home", "homematic").await;

    Mock::given(method("POST"))
        .and(path("/getHost"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&lookup)
        .await;

    let lookup_url = format!("{}/getHost", lookup.uri());
    let settings = hmip_settings(None, Some(&lookup_url), &influx.url());
    let err = hmip::run(&settings).await.unwrap_err();
    assert!(matches!(err, CollectorError::Connection(_)), "{err}");

    assert!(influx.write_bodies().await.is_empty());
}

#[tokio::test]
async fn controller_error_aborts_the_run_before_any_write() {
    let api = MockServer::start().await;
    let influx = MockInflux::start("home", "homematic").await;

    Mock::given(method("POST"))
        .and(path("/hmip/home/getCurrentState"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&api)
        .await;

    let settings = hmip_settings(Some(&api.uri()), None, &influx.url());
    let err = hmip::run(&settings).await.unwrap_err();
    assert!(matches!(err, CollectorError::Connection(_)), "{err}");

    assert!(influx.write_bodies().await.is_empty());
}

#[tokio::test]
async fn missing_configuration_section_fails_fast() {
    let influx = MockInflux::start("home", "homematic").await;
    let mut settings = hmip_settings(Some("http://hcu.invalid"), None, &influx.url());
    settings.homematicip = None;

    let err = hmip::run(&settings).await.unwrap_err();
    assert!(matches!(err, CollectorError::Config(_)), "{err}");
}
