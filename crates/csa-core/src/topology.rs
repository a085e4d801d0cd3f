//! CSA topology graph model.
//!
//! The output schema consumed by downstream renderers. Field names and
//! enumeration tokens round-trip losslessly through serialization: the
//! controller/device types, protocol names, and zone ids below are fixed
//! wire tokens, never abbreviated or renamed per template.

use serde::{Deserialize, Serialize};

/// Controller types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerType {
    #[serde(rename = "PLC")]
    Plc,
    #[serde(rename = "Safety_PLC")]
    SafetyPlc,
    #[serde(rename = "Vendor_PLC")]
    VendorPlc,
}

impl ControllerType {
    /// Purdue zone a controller of this type belongs to.
    pub fn purdue_zone(&self) -> &'static str {
        ZONE_CONTROL
    }
}

/// Device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "RemoteIO")]
    RemoteIo,
    #[serde(rename = "VFD")]
    Vfd,
    #[serde(rename = "Soft_Starter")]
    SoftStarter,
    #[serde(rename = "Motor_Starter")]
    MotorStarter,
    #[serde(rename = "SCADA")]
    Scada,
    #[serde(rename = "HMI")]
    Hmi,
    #[serde(rename = "Historian")]
    Historian,
}

impl DeviceType {
    /// Purdue zone a device of this type belongs to.
    pub fn purdue_zone(&self) -> &'static str {
        match self {
            DeviceType::RemoteIo
            | DeviceType::Vfd
            | DeviceType::SoftStarter
            | DeviceType::MotorStarter => ZONE_FIELD,
            DeviceType::Scada | DeviceType::Hmi | DeviceType::Historian => ZONE_SUPERVISORY,
        }
    }

    /// Protocols a device of this type can terminate.
    ///
    /// Motor and soft starters sit behind the panel's network adapter, so
    /// they accept the panel protocols in addition to plain hardwiring.
    pub fn supported_protocols(&self) -> &'static [ProtocolType] {
        match self {
            DeviceType::Vfd => &[
                ProtocolType::EthernetIp,
                ProtocolType::Profinet,
                ProtocolType::ModbusTcp,
            ],
            DeviceType::RemoteIo => &[ProtocolType::EthernetIp, ProtocolType::Profinet],
            DeviceType::SoftStarter | DeviceType::MotorStarter => &[
                ProtocolType::EthernetIp,
                ProtocolType::Profinet,
                ProtocolType::Hardwired,
            ],
            DeviceType::Scada | DeviceType::Hmi | DeviceType::Historian => {
                &[ProtocolType::EthernetIp, ProtocolType::OpcUa]
            }
        }
    }

    pub fn supports(&self, protocol: ProtocolType) -> bool {
        self.supported_protocols().contains(&protocol)
    }
}

/// Industrial network protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolType {
    #[serde(rename = "Ethernet_IP")]
    EthernetIp,
    #[serde(rename = "Profinet")]
    Profinet,
    #[serde(rename = "Modbus_TCP")]
    ModbusTcp,
    #[serde(rename = "OPC_UA")]
    OpcUa,
    /// Direct wiring, including safety interlocks. Also the structural
    /// fallback when no listed protocol fits a device.
    #[serde(rename = "Hardwired")]
    Hardwired,
}

impl ProtocolType {
    pub fn token(&self) -> &'static str {
        match self {
            ProtocolType::EthernetIp => "Ethernet_IP",
            ProtocolType::Profinet => "Profinet",
            ProtocolType::ModbusTcp => "Modbus_TCP",
            ProtocolType::OpcUa => "OPC_UA",
            ProtocolType::Hardwired => "Hardwired",
        }
    }
}

/// Redundancy topology of a network segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentTopology {
    Star,
    Ring,
}

pub const ZONE_FIELD: &str = "level_0";
pub const ZONE_CONTROL: &str = "level_1";
pub const ZONE_SUPERVISORY: &str = "level_2";

/// An ISA-95 Purdue-model zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub purdue_level: u8,
}

impl Zone {
    /// The standard three-tier zone set every assembled topology carries.
    pub fn standard_set() -> Vec<Zone> {
        vec![
            Zone {
                id: ZONE_FIELD.to_string(),
                name: "Field Level".to_string(),
                purdue_level: 0,
            },
            Zone {
                id: ZONE_CONTROL.to_string(),
                name: "Control Level".to_string(),
                purdue_level: 1,
            },
            Zone {
                id: ZONE_SUPERVISORY.to_string(),
                name: "Supervisory Level".to_string(),
                purdue_level: 2,
            },
        ]
    }
}

/// A controller node. Created only by the allocation engine; zone
/// membership is assigned by the topology assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub id: String,

    #[serde(rename = "type")]
    pub controller_type: ControllerType,

    /// Purdue zone id; empty until assembly.
    #[serde(default)]
    pub zone: String,

    /// Tags of the equipment this controller governs, sorted.
    pub equipment_tags: Vec<String>,

    pub redundant: bool,
}

/// A device node. References (never owns) its parent controller; it can be
/// reparented only by re-running allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,

    #[serde(rename = "type")]
    pub device_type: DeviceType,

    /// Purdue zone id; empty until assembly.
    #[serde(default)]
    pub zone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_controller: Option<String>,
}

/// A logical grouping of same-protocol links sharing a controller,
/// distinct from the individual links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSegment {
    pub id: String,
    pub protocol: ProtocolType,
    /// Member node ids (controller plus devices), sorted.
    pub members: Vec<String>,
    pub redundancy: SegmentTopology,
}

/// A point-to-point protocol link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub protocol: ProtocolType,
    /// Owning segment id, when the link is a segment member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

/// The assembled topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub schema_version: String,
    pub project: String,
    pub zones: Vec<Zone>,
    pub controllers: Vec<Controller>,
    pub devices: Vec<Device>,
    pub segments: Vec<NetworkSegment>,
    pub links: Vec<Link>,
}

pub const SCHEMA_VERSION: &str = "1.0";

impl Topology {
    /// All node ids, controllers and devices alike, in document order.
    pub fn node_ids(&self) -> Vec<&str> {
        self.controllers
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.devices.iter().map(|d| d.id.as_str()))
            .collect()
    }

    pub fn get_controller(&self, id: &str) -> Option<&Controller> {
        self.controllers.iter().find(|c| c.id == id)
    }

    pub fn get_device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// All links touching a node.
    pub fn links_for_node(&self, id: &str) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| l.source == id || l.target == id)
            .collect()
    }

    /// Node ids assigned to a zone.
    pub fn nodes_in_zone(&self, zone_id: &str) -> Vec<&str> {
        self.controllers
            .iter()
            .filter(|c| c.zone == zone_id)
            .map(|c| c.id.as_str())
            .chain(
                self.devices
                    .iter()
                    .filter(|d| d.zone == zone_id)
                    .map(|d| d.id.as_str()),
            )
            .collect()
    }
}
