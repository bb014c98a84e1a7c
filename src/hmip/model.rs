//! Response models for the Homematic IP `getCurrentState` call, plus the
//! conversion into the canonical [`DeviceSnapshot`] shape.
//!
//! The API reports every reading already typed, so there is no value-type
//! decoding here; fields just get renamed onto the canonical datapoint names
//! the classifier expects. RSSI arrives signed and is taken as is.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::classify::DeviceSnapshot;
use crate::decode::{ContactState, DatapointValue};
use crate::error::{CollectorError, Result};

/// The parts of the `getCurrentState` response this collector reads.
///
/// Maps are ordered by id so a run emits points deterministically.
#[derive(Debug, Deserialize)]
pub struct CurrentState {
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,
}

/// A device grouping; rooms are the groups typed `"META"`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "type")]
    pub group_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub channels: Vec<GroupChannel>,
}

/// A device channel reference inside a group
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChannel {
    pub device_id: String,
    #[serde(default)]
    pub channel_index: u32,
}

/// One physical device with its functional channels
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub functional_channels: BTreeMap<String, FunctionalChannel>,
}

/// The channel fields this collector projects; everything else is ignored
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalChannel {
    #[serde(default)]
    pub rssi_device_value: Option<i64>,
    #[serde(default)]
    pub low_bat: Option<bool>,
    #[serde(default)]
    pub unreach: Option<bool>,
    #[serde(default)]
    pub window_state: Option<String>,
    #[serde(default)]
    pub valve_actual_temperature: Option<f64>,
    #[serde(default)]
    pub set_point_temperature: Option<f64>,
    #[serde(default)]
    pub valve_position: Option<f64>,
}

impl Device {
    /// Flatten all functional channels into canonical datapoints. Readings
    /// the device does not report (missing or JSON `null`) stay out of the
    /// map and surface later as missing datapoints if a schema needs them.
    pub fn snapshot(&self, room: &str) -> DeviceSnapshot {
        let mut datapoints = HashMap::new();

        for channel in self.functional_channels.values() {
            if let Some(rssi) = channel.rssi_device_value {
                datapoints.insert("RSSI_DEVICE".to_string(), DatapointValue::Int(rssi));
            }
            if let Some(low_bat) = channel.low_bat {
                datapoints.insert("LOW_BAT".to_string(), DatapointValue::Bool(low_bat));
            }
            if let Some(unreach) = channel.unreach {
                datapoints.insert("UNREACH".to_string(), DatapointValue::Bool(unreach));
            }
            if let Some(window_state) = &channel.window_state {
                let contact = if window_state == "OPEN" {
                    ContactState::Open
                } else {
                    ContactState::Closed
                };
                datapoints.insert("STATE".to_string(), DatapointValue::Contact(contact));
            }
            if let Some(temperature) = channel.valve_actual_temperature {
                datapoints.insert(
                    "ACTUAL_TEMPERATURE".to_string(),
                    DatapointValue::Float(temperature),
                );
            }
            if let Some(set_point) = channel.set_point_temperature {
                datapoints.insert(
                    "SET_POINT_TEMPERATURE".to_string(),
                    DatapointValue::Float(set_point),
                );
            }
            if let Some(position) = channel.valve_position {
                datapoints.insert("LEVEL".to_string(), DatapointValue::Float(position));
            }
        }

        DeviceSnapshot {
            name: self.label.clone(),
            device_type: self.device_type.clone(),
            room: room.to_string(),
            datapoints,
        }
    }
}

impl CurrentState {
    /// One snapshot per device reference in each META group, META groups in
    /// id order and references in listed order. A reference to a device the
    /// response does not carry is a parse error.
    pub fn meta_group_snapshots(&self) -> Result<Vec<DeviceSnapshot>> {
        let mut snapshots = Vec::new();

        for group in self.groups.values().filter(|g| g.group_type == "META") {
            for channel in &group.channels {
                let device = self.devices.get(&channel.device_id).ok_or_else(|| {
                    CollectorError::parsing(format!(
                        "group {:?} references unknown device {}",
                        group.label, channel.device_id
                    ))
                })?;
                snapshots.push(device.snapshot(&group.label));
            }
        }

        Ok(snapshots)
    }
}
