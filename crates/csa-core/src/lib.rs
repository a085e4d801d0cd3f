//! CSA Core Library
//!
//! Derives a draft Control-System-Architecture topology — controllers,
//! field devices, network segments, protocol links — from an equipment
//! list and an instrument I/O database, driven by a named architecture
//! template. Every decision made under ambiguity is flagged as a
//! suggestion for human review; identical inputs always produce a
//! value-identical topology.

pub mod allocation;
pub mod assemble;
pub mod bootstrap;
pub mod digest;
pub mod equipment;
pub mod error;
pub mod io;
pub mod suggestion;
pub mod tag;
pub mod telemetry;
pub mod template;
pub mod topology;

pub use allocation::{rio_module_count, AllocationEngine, AllocationOutput};
pub use assemble::{validate_structure, TopologyAssembler};
pub use bootstrap::{bootstrap, BootstrapOptions, BootstrapResult};
pub use digest::canonical_digest;
pub use equipment::{
    extract_equipment, ControlResponsibility, EquipmentKind, EquipmentRecord, ExtractionOutput,
    FeederClass, FeederType, RawEquipmentList, RawEquipmentRecord,
};
pub use error::{CsaError, Result};
pub use io::{aggregate_signals, IoAggregation, IoSignalSummary, IoType, RawIoSignal};
pub use suggestion::{Mode, Severity, Suggestion};
pub use telemetry::init_tracing;
pub use template::{
    AllocationPolicy, ControllerClass, ControllerClassSettings, PolicyOverrides, ResolvedPolicy,
    TemplateRegistry, TemplateSummary, TopologyShape,
};
pub use topology::{
    Controller, ControllerType, Device, DeviceType, Link, NetworkSegment, ProtocolType,
    SegmentTopology, Topology, Zone,
};

/// CSA core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
