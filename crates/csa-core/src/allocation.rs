//! Allocation engine: the four-stage pipeline that turns equipment
//! records, I/O summaries, and a resolved policy into controllers,
//! devices, segments, and links.
//!
//! Stages run over the full input set, not per-record, because placement
//! for one tag can depend on aggregate counts for its area:
//!
//! 1. grouping — partition by area, split PLC- from vendor-controlled
//! 2. controller placement — dispatch on topology shape
//! 3. device placement — VFDs, starters, remote I/O sizing
//! 4. network generation — protocol selection and segment grouping
//!
//! Output ordering is stable (area ascending, then tag ascending) so that
//! identical inputs always produce value-identical output.

use std::collections::BTreeMap;

use tracing::debug;

use crate::equipment::{EquipmentKind, EquipmentRecord, FeederClass};
use crate::io::{total_signals, IoAggregation};
use crate::suggestion::Suggestion;
use crate::template::{
    AllocationPolicy, ControllerClass, IoPlacement, TopologyShape,
};
use crate::topology::{Controller, ControllerType, Device, DeviceType, Link, NetworkSegment, ProtocolType, SegmentTopology};

/// Id of the single plant PLC under centralized shapes.
pub const PLANT_PLC_ID: &str = "PLC-001";

/// Id of the shared safety PLC under the hybrid-safety shape.
pub const SAFETY_PLC_ID: &str = "SIS-001";

/// Areas with more recognized signals than this get an advisory to split
/// into additional panels.
pub const OVERSIZE_SIGNAL_THRESHOLD: u32 = 500;

/// Result of one allocation run.
#[derive(Debug, Clone, Default)]
pub struct AllocationOutput {
    pub controllers: Vec<Controller>,
    pub devices: Vec<Device>,
    pub segments: Vec<NetworkSegment>,
    pub links: Vec<Link>,

    /// Equipment tag to governing controller id.
    pub equipment_mapping: BTreeMap<String, String>,

    /// Remote I/O module count per area (override-adjusted).
    pub rio_modules: BTreeMap<String, u32>,

    pub suggestions: Vec<Suggestion>,
}

/// Remote I/O modules needed for a signal total at a given spare margin.
///
/// Smallest integer >= total * (1 + spare_io_pct/100) / module_capacity.
pub fn rio_module_count(total: u32, spare_io_pct: u8, module_capacity: u32) -> u32 {
    if total == 0 || module_capacity == 0 {
        return 0;
    }
    let scaled = u64::from(total) * (100 + u64::from(spare_io_pct));
    let denominator = u64::from(module_capacity) * 100;
    ((scaled + denominator - 1) / denominator) as u32
}

/// Supervisory device class derived from an equipment tag prefix.
fn supervisory_class(tag: &str) -> Option<DeviceType> {
    let upper = tag.to_ascii_uppercase();
    if upper.starts_with("SCADA") {
        Some(DeviceType::Scada)
    } else if upper.starts_with("HMI") {
        Some(DeviceType::Hmi)
    } else if upper.starts_with("HIST") {
        Some(DeviceType::Historian)
    } else {
        None
    }
}

struct Grouped<'a> {
    /// PLC-controlled records per area, each area sorted by tag.
    by_area: BTreeMap<String, Vec<&'a EquipmentRecord>>,
    /// Vendor-controlled records, sorted by tag.
    vendor: Vec<&'a EquipmentRecord>,
}

/// The allocation engine. Stateless; one [`run`](AllocationEngine::run)
/// call is one synchronous unit of work over an immutable input snapshot.
pub struct AllocationEngine;

impl AllocationEngine {
    pub fn run(
        records: &[EquipmentRecord],
        io: &IoAggregation,
        policy: &AllocationPolicy,
    ) -> AllocationOutput {
        let mut out = AllocationOutput::default();

        let grouped = group_by_area(records);
        debug!(
            areas = grouped.by_area.len(),
            vendor_packages = grouped.vendor.len(),
            shape = ?policy.topology_shape,
            "equipment grouped"
        );

        let area_controller = place_controllers(&grouped, policy, &mut out);
        place_devices(&grouped, io, policy, &area_controller, &mut out);
        size_remote_io(io, policy, &mut out);
        let vendor_links = place_vendor_packages(&grouped, io, policy, &area_controller, &mut out);
        generate_networks(policy, vendor_links, &mut out);

        out
    }
}

/// Stage 1: partition records by area; separate PLC-controlled from
/// vendor-controlled. MANUAL equipment joins neither side (it still
/// contributes to the area I/O roll-up, which is keyed by area alone).
fn group_by_area(records: &[EquipmentRecord]) -> Grouped<'_> {
    let mut by_area: BTreeMap<String, Vec<&EquipmentRecord>> = BTreeMap::new();
    let mut vendor: Vec<&EquipmentRecord> = Vec::new();

    for record in records {
        if record.is_vendor() {
            vendor.push(record);
        } else if record.control_responsibility == crate::equipment::ControlResponsibility::Plc {
            by_area.entry(record.area.clone()).or_default().push(record);
        }
    }

    for records in by_area.values_mut() {
        records.sort_by(|a, b| a.tag.cmp(&b.tag));
    }
    vendor.sort_by(|a, b| a.tag.cmp(&b.tag));

    Grouped { by_area, vendor }
}

/// Stage 2: controller placement, dispatched on topology shape.
///
/// An area with zero PLC-controlled equipment gets no controller (the
/// grouping stage only materializes non-empty areas, so absence from the
/// returned map is the tie-break).
///
/// Returns the area -> controller-id map used by the later stages.
fn place_controllers(
    grouped: &Grouped<'_>,
    policy: &AllocationPolicy,
    out: &mut AllocationOutput,
) -> BTreeMap<String, String> {
    let mut area_controller: BTreeMap<String, String> = BTreeMap::new();
    let plc_settings = policy.class_settings(ControllerClass::Plc);

    match policy.topology_shape {
        TopologyShape::Centralized | TopologyShape::VendorPackageIntegration => {
            let mut tags: Vec<String> = grouped
                .by_area
                .values()
                .flatten()
                .map(|r| r.tag.clone())
                .collect();
            tags.sort();

            if !tags.is_empty() {
                for tag in &tags {
                    out.equipment_mapping
                        .insert(tag.clone(), PLANT_PLC_ID.to_string());
                }
                for area in grouped.by_area.keys() {
                    area_controller.insert(area.clone(), PLANT_PLC_ID.to_string());
                }
                out.controllers.push(Controller {
                    id: PLANT_PLC_ID.to_string(),
                    controller_type: ControllerType::Plc,
                    zone: String::new(),
                    equipment_tags: tags,
                    redundant: plc_settings.redundant,
                });
            }
        }
        TopologyShape::CentralMccDistributedIo
        | TopologyShape::FullyDistributed
        | TopologyShape::HybridSafety => {
            for (area, records) in &grouped.by_area {
                let id = format!("PLC-{area}");
                let tags: Vec<String> = records.iter().map(|r| r.tag.clone()).collect();
                for tag in &tags {
                    out.equipment_mapping.insert(tag.clone(), id.clone());
                }
                area_controller.insert(area.clone(), id.clone());
                out.controllers.push(Controller {
                    id,
                    controller_type: ControllerType::Plc,
                    zone: String::new(),
                    equipment_tags: tags,
                    redundant: plc_settings.redundant,
                });
            }

            if policy.topology_shape == TopologyShape::HybridSafety
                && !out.controllers.is_empty()
            {
                let safety_settings = policy.class_settings(ControllerClass::SafetyPlc);
                out.controllers.push(Controller {
                    id: SAFETY_PLC_ID.to_string(),
                    controller_type: ControllerType::SafetyPlc,
                    zone: String::new(),
                    equipment_tags: Vec::new(),
                    redundant: safety_settings.redundant,
                });
            }
        }
    }

    area_controller
}

/// Stage 3 (part 1): device placement per area.
fn place_devices(
    grouped: &Grouped<'_>,
    io: &IoAggregation,
    policy: &AllocationPolicy,
    area_controller: &BTreeMap<String, String>,
    out: &mut AllocationOutput,
) {
    // DOL and soft starters are first-class nodes only inside per-area
    // remote panels; under the central-MCC shapes they are wired into the
    // MCC and contribute to I/O sizing alone.
    let starters_are_nodes = matches!(
        policy.topology_shape,
        TopologyShape::FullyDistributed | TopologyShape::HybridSafety
    );

    for (area, records) in &grouped.by_area {
        let Some(controller_id) = area_controller.get(area) else {
            continue;
        };

        if policy.io_placement == IoPlacement::Distributed
            && total_signals(&io.area_counts(area)) > 0
        {
            out.devices.push(Device {
                id: format!("RIO-{area}"),
                device_type: DeviceType::RemoteIo,
                zone: String::new(),
                parent_controller: Some(controller_id.clone()),
            });
        }

        for record in records {
            let summary = io.summary_for(&record.tag);
            let class = record.feeder_type.class();
            let supervisory = supervisory_class(&record.tag);

            match class {
                FeederClass::Vfd => {
                    out.devices.push(Device {
                        id: format!("VFD-{}", record.tag),
                        device_type: DeviceType::Vfd,
                        zone: String::new(),
                        parent_controller: Some(controller_id.clone()),
                    });
                }
                FeederClass::SoftStarter if starters_are_nodes => {
                    out.devices.push(Device {
                        id: format!("SS-{}", record.tag),
                        device_type: DeviceType::SoftStarter,
                        zone: String::new(),
                        parent_controller: Some(controller_id.clone()),
                    });
                }
                FeederClass::Dol if starters_are_nodes => {
                    out.devices.push(Device {
                        id: format!("MS-{}", record.tag),
                        device_type: DeviceType::MotorStarter,
                        zone: String::new(),
                        parent_controller: Some(controller_id.clone()),
                    });
                }
                FeederClass::None => {
                    if let Some(device_type) = supervisory {
                        out.devices.push(Device {
                            id: record.tag.clone(),
                            device_type,
                            zone: String::new(),
                            parent_controller: Some(controller_id.clone()),
                        });
                    }
                }
                FeederClass::Unknown => {
                    out.suggestions.push(
                        Suggestion::warning(
                            record.tag.clone(),
                            format!(
                                "unknown feeder_type '{}', equipment not placed as a device",
                                record.feeder_type.as_str()
                            ),
                        )
                        .with_resolution(
                            "map the feeder to one of DOL|VFD|SOFT_STARTER|VENDOR_PACKAGE|NONE",
                        ),
                    );
                }
                FeederClass::Dol | FeederClass::SoftStarter | FeederClass::VendorPackage => {}
            }

            if record.kind == EquipmentKind::Equipment
                && supervisory.is_none()
                && summary.total() == 0
                && summary.other == 0
            {
                out.suggestions.push(
                    Suggestion::warning(
                        record.tag.clone(),
                        "equipment has no I/O signals in the instrument database",
                    )
                    .with_resolution("verify the instrument database covers this tag"),
                );
            }
        }
    }
}

/// Stage 3 (part 2): remote I/O module sizing per area.
fn size_remote_io(io: &IoAggregation, policy: &AllocationPolicy, out: &mut AllocationOutput) {
    let capacity = policy.class_settings(ControllerClass::Plc).module_capacity;

    for (area, counts) in &io.per_area {
        let total = total_signals(counts);

        if let Some(&panels) = policy.panel_count_overrides.get(area) {
            let computed = rio_module_count(total, policy.spare_io_pct, capacity);
            out.rio_modules.insert(area.clone(), panels);
            out.suggestions.push(Suggestion::info(
                area.clone(),
                format!(
                    "panel_count override ({panels}) replaces computed module count ({computed})"
                ),
            ));
        } else if total > 0 {
            out.rio_modules.insert(
                area.clone(),
                rio_module_count(total, policy.spare_io_pct, capacity),
            );
        }

        if total > OVERSIZE_SIGNAL_THRESHOLD {
            out.suggestions.push(Suggestion::info(
                area.clone(),
                format!(
                    "area carries {total} I/O points, consider additional remote panels"
                ),
            ));
        }
    }

    // Overrides may name areas absent from the instrument database.
    for (area, &panels) in &policy.panel_count_overrides {
        if !io.per_area.contains_key(area) {
            out.rio_modules.insert(area.clone(), panels);
            out.suggestions.push(Suggestion::info(
                area.clone(),
                format!("panel_count override ({panels}) applied to area with no recorded I/O"),
            ));
        }
    }
}

/// Stage 1 corollary: vendor packages. Each vendor-controlled record
/// yields exactly one VENDOR_PLC plus a data link (OPC_UA) and a
/// hardwired interlock link to the nearest plant-side controller. This
/// dual-link rule holds across all topology shapes.
fn place_vendor_packages(
    grouped: &Grouped<'_>,
    io: &IoAggregation,
    policy: &AllocationPolicy,
    area_controller: &BTreeMap<String, String>,
    out: &mut AllocationOutput,
) -> Vec<Link> {
    let mut vendor_links = Vec::new();
    let vendor_settings = policy.class_settings(ControllerClass::VendorPlc);

    // Plant-side fallback when the package's own area has no controller.
    let fallback_controller: Option<String> = out
        .controllers
        .iter()
        .find(|c| c.controller_type == ControllerType::Plc)
        .map(|c| c.id.clone());

    for record in &grouped.vendor {
        let package_id = format!("PKG-{}", record.tag);
        out.equipment_mapping
            .insert(record.tag.clone(), package_id.clone());
        out.controllers.push(Controller {
            id: package_id.clone(),
            controller_type: ControllerType::VendorPlc,
            zone: String::new(),
            equipment_tags: vec![record.tag.clone()],
            redundant: vendor_settings.redundant,
        });

        let plant_side = area_controller
            .get(&record.area)
            .cloned()
            .or_else(|| fallback_controller.clone());

        match plant_side {
            Some(plant_id) => {
                vendor_links.push(Link {
                    source: plant_id.clone(),
                    target: package_id.clone(),
                    protocol: ProtocolType::OpcUa,
                    segment: None,
                });
                vendor_links.push(Link {
                    source: plant_id,
                    target: package_id.clone(),
                    protocol: ProtocolType::Hardwired,
                    segment: None,
                });
            }
            None => {
                out.suggestions.push(
                    Suggestion::warning(
                        record.tag.clone(),
                        "vendor package has no plant-side controller to integrate with; \
                         OPC_UA and interlock links omitted",
                    )
                    .with_resolution("assign at least one equipment record to PLC control"),
                );
            }
        }

        if io.summary_for(&record.tag).interlock_channels() == 0 {
            out.suggestions.push(
                Suggestion::warning(
                    record.tag.clone(),
                    "vendor package declares no interlock channel (no DI/DO signals)",
                )
                .with_resolution("add hardwired interlock signals to the instrument database"),
            );
        }
    }

    vendor_links
}

/// Stage 4: one link per controller-device relationship, protocol chosen
/// as the first policy preference the device supports; same-protocol links
/// sharing a controller collapse into one network segment.
fn generate_networks(
    policy: &AllocationPolicy,
    vendor_links: Vec<Link>,
    out: &mut AllocationOutput,
) {
    let mut segment_members: BTreeMap<(String, ProtocolType), Vec<String>> = BTreeMap::new();
    let mut links: Vec<Link> = Vec::new();

    for device in &out.devices {
        let Some(parent) = device.parent_controller.clone() else {
            continue;
        };

        let protocol = match policy
            .protocol_preferences
            .iter()
            .copied()
            .find(|p| device.device_type.supports(*p))
        {
            Some(protocol) => protocol,
            None => {
                out.suggestions.push(
                    Suggestion::blocking(
                        device.id.clone(),
                        format!(
                            "no protocol in the preference list is supported by this \
                             device type; fell back to {}",
                            ProtocolType::Hardwired.token()
                        ),
                    )
                    .with_resolution("extend protocol_preferences or change the device type"),
                );
                ProtocolType::Hardwired
            }
        };

        // Field devices join a per-controller segment; supervisory links
        // stay point-to-point.
        let segment = match device.device_type {
            DeviceType::Scada | DeviceType::Hmi | DeviceType::Historian => None,
            _ => {
                segment_members
                    .entry((parent.clone(), protocol))
                    .or_default()
                    .push(device.id.clone());
                Some(format!("NET-{parent}-{}", protocol.token()))
            }
        };

        links.push(Link {
            source: parent,
            target: device.id.clone(),
            protocol,
            segment,
        });
    }

    for ((controller_id, protocol), mut device_ids) in segment_members {
        let redundant = out
            .controllers
            .iter()
            .find(|c| c.id == controller_id)
            .map(|c| c.redundant)
            .unwrap_or(false);

        device_ids.push(controller_id.clone());
        device_ids.sort();

        out.segments.push(NetworkSegment {
            id: format!("NET-{controller_id}-{}", protocol.token()),
            protocol,
            members: device_ids,
            redundancy: if redundant {
                SegmentTopology::Ring
            } else {
                SegmentTopology::Star
            },
        });
    }

    links.extend(vendor_links);
    out.links = links;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{
        ControlResponsibility, EquipmentKind, EquipmentRecord, FeederType,
    };
    use crate::io::{aggregate_signals, RawIoSignal};
    use crate::suggestion::{Mode, Severity};
    use crate::template::{PolicyOverrides, TemplateRegistry};

    fn record(tag: &str, feeder: &str, resp: ControlResponsibility, area: &str) -> EquipmentRecord {
        EquipmentRecord {
            tag: tag.to_string(),
            feeder_type: FeederType::new(feeder),
            control_responsibility: resp,
            area: area.to_string(),
            kind: EquipmentKind::Equipment,
        }
    }

    fn signal(tag: &str, io_type: &str, count: u32) -> RawIoSignal {
        RawIoSignal {
            equipment_tag: tag.to_string(),
            io_type: io_type.to_string(),
            count,
        }
    }

    fn policy(template: &str) -> crate::template::AllocationPolicy {
        TemplateRegistry::builtin()
            .resolve(template, "1.0", &PolicyOverrides::new(), Mode::Lenient)
            .expect("builtin template")
            .policy
    }

    #[test]
    fn test_rio_module_count_math() {
        // 6 signals at 20% spare over 16-point modules: 7.2 points -> 1.
        assert_eq!(rio_module_count(6, 20, 16), 1);
        // 100 signals at 25% spare: 125 points -> 8 modules.
        assert_eq!(rio_module_count(100, 25, 16), 8);
        // Exact fit needs no extra module.
        assert_eq!(rio_module_count(40, 0, 8), 5);
        assert_eq!(rio_module_count(0, 20, 16), 0);
    }

    #[test]
    fn test_centralized_single_controller() {
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            record("300-P-01", "DOL", ControlResponsibility::Plc, "300"),
        ];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 2), signal("300-P-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy("centralized"));

        assert_eq!(out.controllers.len(), 1);
        assert_eq!(out.controllers[0].id, PLANT_PLC_ID);
        assert_eq!(out.controllers[0].equipment_tags.len(), 2);
        assert_eq!(out.equipment_mapping["300-P-01"], PLANT_PLC_ID);
        // DOL stays an MCC attribute, not a node, under centralized.
        assert!(out.devices.iter().all(|d| d.device_type != DeviceType::MotorStarter));
    }

    #[test]
    fn test_no_empty_area_controllers() {
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            record("300-X-01", "NONE", ControlResponsibility::Manual, "300"),
        ];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy("fully_distributed"));

        assert_eq!(out.controllers.len(), 1);
        assert_eq!(out.controllers[0].id, "PLC-200");
        // Manual equipment is never mapped to a controller.
        assert!(!out.equipment_mapping.contains_key("300-X-01"));
    }

    #[test]
    fn test_hybrid_safety_adds_shared_safety_plc() {
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            record("300-P-01", "DOL", ControlResponsibility::Plc, "300"),
        ];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 2), signal("300-P-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy("hybrid_safety"));

        let safety: Vec<_> = out
            .controllers
            .iter()
            .filter(|c| c.controller_type == ControllerType::SafetyPlc)
            .collect();
        assert_eq!(safety.len(), 1);
        assert_eq!(safety[0].id, SAFETY_PLC_ID);
        assert!(safety[0].redundant);
    }

    #[test]
    fn test_starters_become_nodes_only_when_distributed() {
        let records = vec![record("300-P-01", "DOL", ControlResponsibility::Plc, "300")];
        let io = aggregate_signals(&[signal("300-P-01", "DI", 2)]);

        let distributed = AllocationEngine::run(&records, &io, &policy("fully_distributed"));
        assert!(distributed
            .devices
            .iter()
            .any(|d| d.id == "MS-300-P-01" && d.device_type == DeviceType::MotorStarter));

        let central = AllocationEngine::run(&records, &io, &policy("centralized"));
        assert!(!central.devices.iter().any(|d| d.id == "MS-300-P-01"));
    }

    #[test]
    fn test_vendor_package_dual_link() {
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            EquipmentRecord {
                tag: "400-MBR-01".to_string(),
                feeder_type: FeederType::new("VENDOR_PACKAGE"),
                control_responsibility: ControlResponsibility::Vendor,
                area: "400".to_string(),
                kind: EquipmentKind::Package,
            },
        ];
        let io = aggregate_signals(&[
            signal("200-B-01", "DI", 2),
            signal("400-MBR-01", "DI", 4),
            signal("400-MBR-01", "DO", 2),
        ]);
        let out = AllocationEngine::run(&records, &io, &policy("centralized"));

        let vendor: Vec<_> = out
            .controllers
            .iter()
            .filter(|c| c.controller_type == ControllerType::VendorPlc)
            .collect();
        assert_eq!(vendor.len(), 1);
        assert_eq!(vendor[0].id, "PKG-400-MBR-01");

        let touching: Vec<_> = out
            .links
            .iter()
            .filter(|l| l.target == "PKG-400-MBR-01" || l.source == "PKG-400-MBR-01")
            .collect();
        assert_eq!(touching.len(), 2);
        assert!(touching.iter().any(|l| l.protocol == ProtocolType::OpcUa));
        assert!(touching.iter().any(|l| l.protocol == ProtocolType::Hardwired));
        assert_eq!(out.equipment_mapping["400-MBR-01"], "PKG-400-MBR-01");
    }

    #[test]
    fn test_vendor_package_without_plant_controller_is_flagged() {
        let records = vec![EquipmentRecord {
            tag: "400-MBR-01".to_string(),
            feeder_type: FeederType::new("VENDOR_PACKAGE"),
            control_responsibility: ControlResponsibility::Vendor,
            area: "400".to_string(),
            kind: EquipmentKind::Package,
        }];
        let io = aggregate_signals(&[signal("400-MBR-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy("vendor_package_integration"));

        assert_eq!(out.controllers.len(), 1);
        assert!(out.links.is_empty());
        assert!(out
            .suggestions
            .iter()
            .any(|s| s.severity == Severity::Warning
                && s.message.contains("no plant-side controller")));
    }

    #[test]
    fn test_vendor_package_missing_interlock_channel_is_flagged() {
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            EquipmentRecord {
                tag: "400-RO-01".to_string(),
                feeder_type: FeederType::new("VENDOR_PACKAGE"),
                control_responsibility: ControlResponsibility::Vendor,
                area: "400".to_string(),
                kind: EquipmentKind::Package,
            },
        ];
        // Vendor package has only analog signals: no interlock channel.
        let io = aggregate_signals(&[
            signal("200-B-01", "DI", 2),
            signal("400-RO-01", "AI", 6),
        ]);
        let out = AllocationEngine::run(&records, &io, &policy("centralized"));

        assert!(out
            .suggestions
            .iter()
            .any(|s| s.subject == "400-RO-01" && s.message.contains("interlock")));
    }

    #[test]
    fn test_unknown_feeder_type_flagged_not_placed() {
        let records = vec![record(
            "200-P-01",
            "HYDRAULIC",
            ControlResponsibility::Plc,
            "200",
        )];
        let io = aggregate_signals(&[signal("200-P-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy("centralized"));

        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.suggestions[0].severity, Severity::Warning);
        assert!(out.suggestions[0].message.contains("HYDRAULIC"));
        assert!(out.devices.is_empty());
    }

    #[test]
    fn test_zero_io_equipment_flagged() {
        let records = vec![record("200-P-01", "DOL", ControlResponsibility::Plc, "200")];
        let out = AllocationEngine::run(&records, &aggregate_signals(&[]), &policy("centralized"));

        assert!(out
            .suggestions
            .iter()
            .any(|s| s.subject == "200-P-01" && s.message.contains("no I/O signals")));
    }

    #[test]
    fn test_protocol_fallback_is_blocking() {
        let registry = TemplateRegistry::builtin();
        let mut overrides = PolicyOverrides::new();
        overrides.insert(
            "protocol_preferences".to_string(),
            serde_json::json!(["OPC_UA"]),
        );
        let policy = registry
            .resolve("fully_distributed", "1.0", &overrides, Mode::Lenient)
            .expect("resolve")
            .policy;

        let records = vec![record("200-B-01", "VFD", ControlResponsibility::Plc, "200")];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy);

        // VFDs do not terminate OPC_UA; the link falls back to hardwired.
        let link = out
            .links
            .iter()
            .find(|l| l.target == "VFD-200-B-01")
            .expect("vfd link");
        assert_eq!(link.protocol, ProtocolType::Hardwired);
        assert!(out
            .suggestions
            .iter()
            .any(|s| s.severity == Severity::Blocking));
    }

    #[test]
    fn test_segments_group_same_protocol_per_controller() {
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            record("200-B-02", "VFD", ControlResponsibility::Plc, "200"),
        ];
        let io = aggregate_signals(&[
            signal("200-B-01", "DI", 2),
            signal("200-B-02", "DI", 2),
        ]);
        let out = AllocationEngine::run(&records, &io, &policy("fully_distributed"));

        // RIO + two VFDs all speak Profinet to PLC-200: one segment.
        assert_eq!(out.segments.len(), 1);
        let segment = &out.segments[0];
        assert_eq!(segment.id, "NET-PLC-200-Profinet");
        assert_eq!(segment.redundancy, SegmentTopology::Ring);
        assert!(segment.members.contains(&"PLC-200".to_string()));
        assert!(segment.members.contains(&"RIO-200".to_string()));

        for link in out.links.iter().filter(|l| l.segment.is_some()) {
            assert_eq!(link.segment.as_deref(), Some(segment.id.as_str()));
            assert_eq!(link.protocol, segment.protocol);
        }
    }

    #[test]
    fn test_panel_count_override_wins_with_info() {
        let registry = TemplateRegistry::builtin();
        let mut overrides = PolicyOverrides::new();
        overrides.insert("panel_counts".to_string(), serde_json::json!({"200": 4}));
        let policy = registry
            .resolve("fully_distributed", "1.0", &overrides, Mode::Lenient)
            .expect("resolve")
            .policy;

        let records = vec![record("200-B-01", "VFD", ControlResponsibility::Plc, "200")];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 6)]);
        let out = AllocationEngine::run(&records, &io, &policy);

        assert_eq!(out.rio_modules["200"], 4);
        assert!(out
            .suggestions
            .iter()
            .any(|s| s.severity == Severity::Info && s.subject == "200"));
    }

    #[test]
    fn test_oversized_area_advisory() {
        let records = vec![record("200-B-01", "VFD", ControlResponsibility::Plc, "200")];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 600)]);
        let out = AllocationEngine::run(&records, &io, &policy("fully_distributed"));

        assert!(out
            .suggestions
            .iter()
            .any(|s| s.severity == Severity::Info && s.message.contains("600")));
    }

    #[test]
    fn test_supervisory_equipment_becomes_level2_device() {
        let mut scada = record("SCADA-01", "NONE", ControlResponsibility::Plc, "200");
        scada.kind = EquipmentKind::Equipment;
        let records = vec![
            record("200-B-01", "VFD", ControlResponsibility::Plc, "200"),
            scada,
        ];
        let io = aggregate_signals(&[signal("200-B-01", "DI", 2)]);
        let out = AllocationEngine::run(&records, &io, &policy("centralized"));

        let device = out
            .devices
            .iter()
            .find(|d| d.id == "SCADA-01")
            .expect("scada device");
        assert_eq!(device.device_type, DeviceType::Scada);
        // Supervisory links are point-to-point, outside any segment.
        let link = out
            .links
            .iter()
            .find(|l| l.target == "SCADA-01")
            .expect("scada link");
        assert!(link.segment.is_none());
    }
}
