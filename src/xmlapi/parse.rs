//! Parsers for the three CCU XML-API documents: room list, device list and
//! per-device state.
//!
//! The XML-API addon serves attribute-only documents; everything of interest
//! sits in attributes of `<room>`, `<channel>`, `<device>` and `<datapoint>`
//! elements. Missing attributes are parse errors, the documents are small
//! enough to parse in one pass.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::decode::{decode_datapoint, DatapointValue};
use crate::error::{CollectorError, Result};

/// Channel-id to room-name mapping built from `roomlist.cgi`
#[derive(Debug, Default)]
pub struct RoomIndex {
    channels: HashMap<String, String>,
}

impl RoomIndex {
    pub fn room_for_channel(&self, channel_id: &str) -> Option<&str> {
        self.channels.get(channel_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// One `<device>` entry from `devicelist.cgi`
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub ise_id: String,
    pub name: String,
    pub device_type: String,
    /// Channel ids in document order
    pub channel_ids: Vec<String>,
}

impl DeviceEntry {
    /// Room of the first channel present in the index, scanning channels in
    /// listed order. `None` means the device belongs to no mapped room and is
    /// dropped before any state fetch.
    pub fn resolve_room<'a>(&self, rooms: &'a RoomIndex) -> Option<&'a str> {
        self.channel_ids
            .iter()
            .find_map(|id| rooms.room_for_channel(id))
    }
}

fn require_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        CollectorError::parsing(format!(
            "<{}> element missing {name:?} attribute",
            node.tag_name().name()
        ))
    })
}

fn element_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// Parse `roomlist.cgi` into the channel-to-room index.
///
/// A channel listed under more than one room keeps the room parsed last.
pub fn parse_room_list(xml: &str) -> Result<RoomIndex> {
    let doc = Document::parse(xml)?;
    let mut channels = HashMap::new();

    for room in element_children(doc.root_element()) {
        let room_name = require_attr(room, "name")?;
        for channel in element_children(room) {
            let ise_id = require_attr(channel, "ise_id")?;
            channels.insert(ise_id.to_string(), room_name.to_string());
        }
    }

    Ok(RoomIndex { channels })
}

/// Parse `devicelist.cgi`, preserving document order.
pub fn parse_device_list(xml: &str) -> Result<Vec<DeviceEntry>> {
    let doc = Document::parse(xml)?;
    let mut devices = Vec::new();

    for device in element_children(doc.root_element()) {
        let channel_ids = element_children(device)
            .map(|channel| require_attr(channel, "ise_id").map(str::to_string))
            .collect::<Result<Vec<_>>>()?;

        devices.push(DeviceEntry {
            ise_id: require_attr(device, "ise_id")?.to_string(),
            name: require_attr(device, "name")?.to_string(),
            device_type: require_attr(device, "device_type")?.to_string(),
            channel_ids,
        });
    }

    Ok(devices)
}

/// Parse one `state.cgi` response into decoded datapoints.
///
/// The device element carries two ordered datapoint groups, the maintenance
/// group first and the functional group second. Both decode the same way and
/// merge into one map; on a shared datapoint name the functional group wins.
/// Further groups, which current firmware does not emit, are ignored.
pub fn parse_device_state(xml: &str) -> Result<HashMap<String, DatapointValue>> {
    let doc = Document::parse(xml)?;
    let device = element_children(doc.root_element())
        .next()
        .ok_or_else(|| CollectorError::parsing("state document has no device element"))?;

    let groups: Vec<_> = element_children(device).take(2).collect();
    if groups.len() < 2 {
        return Err(CollectorError::parsing(format!(
            "device state for {:?} has {} datapoint groups, expected two",
            device.attribute("name").unwrap_or("?"),
            groups.len()
        )));
    }

    let mut datapoints = HashMap::new();
    for group in groups {
        for datapoint in element_children(group) {
            let type_name = require_attr(datapoint, "type")?;
            let value_type = require_attr(datapoint, "valuetype")?;
            let raw = require_attr(datapoint, "value")?;
            datapoints.insert(
                type_name.to_string(),
                decode_datapoint(type_name, value_type, raw)?,
            );
        }
    }

    Ok(datapoints)
}
