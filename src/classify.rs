//! Device classification: turns a decoded device into at most one metric
//! point.
//!
//! Both ingestion paths (CCU XML-API and Homematic IP) produce a
//! [`DeviceSnapshot`] with the same canonical datapoint names, so the
//! projection into the output schema lives here exactly once. Classification
//! is a closed table keyed on the device-type tag; unrecognized types produce
//! no point and are otherwise ignored.

use std::collections::HashMap;

use crate::decode::{ContactState, DatapointValue};
use crate::error::{CollectorError, Result};
use crate::point::MetricPoint;

/// A device after room resolution and state decoding, in the shape shared by
/// both ingestion paths.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub name: String,
    pub device_type: String,
    pub room: String,
    pub datapoints: HashMap<String, DatapointValue>,
}

impl DeviceSnapshot {
    fn datapoint(&self, key: &str) -> Result<DatapointValue> {
        self.datapoints.get(key).copied().ok_or_else(|| {
            CollectorError::missing_datapoint(format!("{key} on device {:?}", self.name))
        })
    }

    fn bool_datapoint(&self, key: &str) -> Result<bool> {
        self.datapoint(key)?.as_bool().ok_or_else(|| {
            CollectorError::decode(format!("{key} on device {:?} has no boolean value", self.name))
        })
    }

    fn int_datapoint(&self, key: &str) -> Result<i64> {
        self.datapoint(key)?.as_i64().ok_or_else(|| {
            CollectorError::decode(format!("{key} on device {:?} has no integer value", self.name))
        })
    }

    fn float_datapoint(&self, key: &str) -> Result<f64> {
        self.datapoint(key)?.as_f64().ok_or_else(|| {
            CollectorError::decode(format!("{key} on device {:?} has no float value", self.name))
        })
    }

    fn contact_datapoint(&self, key: &str) -> Result<ContactState> {
        self.datapoint(key)?.as_contact().ok_or_else(|| {
            CollectorError::decode(format!("{key} on device {:?} has no contact state", self.name))
        })
    }
}

/// The device kinds this collector knows how to project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    WindowContact,
    Thermostat,
}

impl DeviceKind {
    /// Map a device-type tag onto a kind. Matching is exact and
    /// case-sensitive; the table carries the CCU hardware model tags and the
    /// Homematic IP type names side by side.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "HMIP-SWDO" | "HmIP-SWDM" | "SHUTTER_CONTACT" | "SHUTTER_CONTACT_MAGNETIC" => {
                Some(Self::WindowContact)
            }
            "HmIP-eTRV-B" | "HEATING_THERMOSTAT" => Some(Self::Thermostat),
            _ => None,
        }
    }

    pub fn measurement(&self) -> &'static str {
        match self {
            Self::WindowContact => "window",
            Self::Thermostat => "thermostat",
        }
    }
}

/// Project a decoded device into its metric point.
///
/// Returns `Ok(None)` for device types outside the classification table. For
/// recognized devices every datapoint the schema names must be present and
/// carry a usable value; anything else fails the run rather than writing a
/// fabricated reading.
pub fn classify(snapshot: &DeviceSnapshot) -> Result<Option<MetricPoint>> {
    let Some(kind) = DeviceKind::from_type_tag(&snapshot.device_type) else {
        return Ok(None);
    };

    let point = MetricPoint::new(kind.measurement())
        .tag("room", snapshot.room.as_str())
        .tag("device", snapshot.name.as_str());

    let point = match kind {
        DeviceKind::WindowContact => point
            .field(
                "state",
                snapshot.contact_datapoint("STATE")? == ContactState::Open,
            )
            .field("rssi", snapshot.int_datapoint("RSSI_DEVICE")?)
            .field("lowbat", snapshot.bool_datapoint("LOW_BAT")?)
            .field("unreach", snapshot.bool_datapoint("UNREACH")?),
        DeviceKind::Thermostat => point
            .field("temperature", snapshot.float_datapoint("ACTUAL_TEMPERATURE")?)
            .field(
                "target_temperature",
                snapshot.float_datapoint("SET_POINT_TEMPERATURE")?,
            )
            .field("valve_position", snapshot.float_datapoint("LEVEL")?)
            .field("rssi", snapshot.int_datapoint("RSSI_DEVICE")?)
            .field("lowbat", snapshot.bool_datapoint("LOW_BAT")?)
            .field("unreach", snapshot.bool_datapoint("UNREACH")?),
    };

    Ok(Some(point))
}
