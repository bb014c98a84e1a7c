//! Output data model: one [`MetricPoint`] per classified device.
//!
//! A point is a measurement name, string tags and typed fields. Points carry
//! no timestamp; the server assigns receipt time on write. The batch for a
//! run preserves the order points were produced in.

use influxdb2::models::DataPoint;

use crate::error::{CollectorError, Result};

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// One record destined for the time-series sink
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub measurement: &'static str,
    pub tags: Vec<(&'static str, String)>,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl MetricPoint {
    pub fn new(measurement: &'static str) -> Self {
        Self {
            measurement,
            tags: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn tag(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.tags.push((key, value.into()));
        self
    }

    pub fn field(mut self, key: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    /// Look up a field by name, mainly for assertions and logging.
    pub fn field_value(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Convert into the wire representation the InfluxDB client writes.
    pub fn into_data_point(self) -> Result<DataPoint> {
        let mut builder = DataPoint::builder(self.measurement);
        for (key, value) in self.tags {
            builder = builder.tag(key, value);
        }
        for (key, value) in self.fields {
            builder = match value {
                FieldValue::Float(v) => builder.field(key, v),
                FieldValue::Integer(v) => builder.field(key, v),
                FieldValue::Boolean(v) => builder.field(key, v),
            };
        }
        builder
            .build()
            .map_err(|e| CollectorError::InfluxWrite(format!("failed to build data point: {e}")))
    }
}
