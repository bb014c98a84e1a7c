//! Datapoint decoding for the CCU XML-API state payloads.
//!
//! Each datapoint arrives as a raw string plus a declared value-type code.
//! Decoding applies a fixed rule order: an empty raw value is an absent
//! reading no matter what the declared type says, RSSI readings get their
//! +256 storage offset removed, and only then does the value-type code pick
//! the parser. Codes this module does not know decode to [`DatapointValue::Absent`]
//! rather than failing the run.

use tracing::debug;

use crate::error::{CollectorError, Result};

/// Operating voltage status reported by battery devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingVoltageStatus {
    Normal,
    Unknown,
    Overflow,
}

impl OperatingVoltageStatus {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Unknown),
            2 => Some(Self::Overflow),
            _ => None,
        }
    }
}

/// Binary contact state of window/door sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactState {
    Closed,
    Open,
}

impl ContactState {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            _ => None,
        }
    }
}

/// A decoded datapoint reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatapointValue {
    /// The device reported no value (empty raw string, or a value type this
    /// collector does not handle)
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    VoltageStatus(OperatingVoltageStatus),
    Contact(ContactState),
}

impl DatapointValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_contact(&self) -> Option<ContactState> {
        match self {
            Self::Contact(v) => Some(*v),
            _ => None,
        }
    }
}

fn parse_int(type_name: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| CollectorError::decode(format!("{type_name}: invalid integer {raw:?}")))
}

fn parse_float(type_name: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| CollectorError::decode(format!("{type_name}: invalid float {raw:?}")))
}

/// Decode one raw datapoint according to its name and declared value type.
///
/// `value_type` is the code as it appears on the wire: `2` boolean, `4`
/// float, `8` integer, `16` enumeration. Enumerations are closed and
/// dispatched on the datapoint name; an out-of-range code or an unknown
/// enumeration name is a decode error.
pub fn decode_datapoint(type_name: &str, value_type: &str, raw: &str) -> Result<DatapointValue> {
    if raw.is_empty() {
        return Ok(DatapointValue::Absent);
    }

    // RSSI is stored as the signed dBm value offset by +256.
    if type_name == "RSSI_DEVICE" {
        return Ok(DatapointValue::Int(parse_int(type_name, raw)? - 256));
    }

    match value_type {
        "2" => Ok(DatapointValue::Bool(raw == "true")),
        "4" => Ok(DatapointValue::Float(parse_float(type_name, raw)?)),
        "8" => Ok(DatapointValue::Int(parse_int(type_name, raw)?)),
        "16" => {
            let code = parse_int(type_name, raw)?;
            match type_name {
                "OPERATING_VOLTAGE_STATUS" => OperatingVoltageStatus::from_code(code)
                    .map(DatapointValue::VoltageStatus)
                    .ok_or_else(|| {
                        CollectorError::decode(format!(
                            "{type_name}: enumeration code {code} out of range"
                        ))
                    }),
                "STATE" => ContactState::from_code(code)
                    .map(DatapointValue::Contact)
                    .ok_or_else(|| {
                        CollectorError::decode(format!(
                            "{type_name}: enumeration code {code} out of range"
                        ))
                    }),
                _ => Err(CollectorError::decode(format!(
                    "unknown enumeration datapoint {type_name}"
                ))),
            }
        }
        other => {
            debug!(datapoint = type_name, value_type = other, "unhandled value type");
            Ok(DatapointValue::Absent)
        }
    }
}
