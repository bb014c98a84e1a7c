//! HomeMatic to InfluxDB telemetry collector.
//!
//! A stateless one-run ETL: poll a HomeMatic controller, map devices to
//! rooms, decode their state, project recognized devices (window contacts and
//! thermostats) onto a fixed metric schema, and write the whole batch to
//! InfluxDB 2.x in one call.
//!
//! Two ingestion paths exist against two controller APIs:
//!
//! - [`xmlapi`] polls a CCU running the XML-API addon (`roomlist.cgi`,
//!   `devicelist.cgi`, `state.cgi`), driven by the `homematic-influx` binary.
//! - [`hmip`] polls the Homematic IP REST API (`getCurrentState`), driven by
//!   the `homematic-influx-ip` binary.
//!
//! Both converge on [`classify::DeviceSnapshot`], so classification and the
//! sink are shared.

pub mod classify;
pub mod config;
pub mod decode;
pub mod error;
pub mod hmip;
pub mod influx;
pub mod point;
pub mod xmlapi;

pub use error::{CollectorError, Result};
