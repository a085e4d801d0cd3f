//! Topology assembly and structural validation.
//!
//! Wraps allocation output into the canonical topology graph: assigns
//! Purdue zone membership from the per-type table and checks structural
//! integrity. Validation failures surface as BLOCKING suggestions; the
//! bootstrap boundary decides whether they abort (strict) or ride along
//! (lenient).

use std::collections::BTreeSet;

use crate::allocation::AllocationOutput;
use crate::suggestion::Suggestion;
use crate::topology::{Topology, Zone, SCHEMA_VERSION};

/// Assembles allocation output into a [`Topology`] and validates it.
pub struct TopologyAssembler;

impl TopologyAssembler {
    /// Build the canonical topology graph and run structural validation.
    ///
    /// Returns the assembled topology plus any validation findings.
    pub fn assemble(project: &str, alloc: &AllocationOutput) -> (Topology, Vec<Suggestion>) {
        let mut controllers = alloc.controllers.clone();
        for controller in &mut controllers {
            controller.zone = controller.controller_type.purdue_zone().to_string();
        }

        let mut devices = alloc.devices.clone();
        for device in &mut devices {
            device.zone = device.device_type.purdue_zone().to_string();
        }

        let topology = Topology {
            schema_version: SCHEMA_VERSION.to_string(),
            project: project.to_string(),
            zones: Zone::standard_set(),
            controllers,
            devices,
            segments: alloc.segments.clone(),
            links: alloc.links.clone(),
        };

        let findings = validate_structure(&topology);
        (topology, findings)
    }
}

/// Structural validation over an assembled topology.
///
/// Checks, each yielding a BLOCKING suggestion on failure:
/// - no two nodes share an id
/// - every link endpoint resolves to a known node id
/// - every device parent references an existing controller
/// - a link claiming segment membership matches that segment's protocol,
///   and both endpoints are segment members
pub fn validate_structure(topology: &Topology) -> Vec<Suggestion> {
    let mut findings = Vec::new();

    let mut node_ids: BTreeSet<&str> = BTreeSet::new();
    for id in topology.node_ids() {
        if !node_ids.insert(id) {
            findings.push(Suggestion::blocking(
                id.to_string(),
                "duplicate node id in assembled topology",
            ));
        }
    }

    let controller_ids: BTreeSet<&str> = topology
        .controllers
        .iter()
        .map(|c| c.id.as_str())
        .collect();

    for device in &topology.devices {
        if let Some(parent) = &device.parent_controller {
            if !controller_ids.contains(parent.as_str()) {
                findings.push(Suggestion::blocking(
                    device.id.clone(),
                    format!("parent_controller '{parent}' does not exist"),
                ));
            }
        }
    }

    for link in &topology.links {
        for endpoint in [&link.source, &link.target] {
            if !node_ids.contains(endpoint.as_str()) {
                findings.push(Suggestion::blocking(
                    format!("{} -> {}", link.source, link.target),
                    format!("link endpoint '{endpoint}' does not resolve to a known node"),
                ));
            }
        }

        if let Some(segment_id) = &link.segment {
            match topology.segments.iter().find(|s| &s.id == segment_id) {
                Some(segment) => {
                    if segment.protocol != link.protocol {
                        findings.push(Suggestion::blocking(
                            format!("{} -> {}", link.source, link.target),
                            format!(
                                "link protocol {} differs from segment '{}' protocol {}",
                                link.protocol.token(),
                                segment_id,
                                segment.protocol.token()
                            ),
                        ));
                    }
                    for endpoint in [&link.source, &link.target] {
                        if !segment.members.contains(endpoint) {
                            findings.push(Suggestion::blocking(
                                format!("{} -> {}", link.source, link.target),
                                format!(
                                    "link endpoint '{endpoint}' is not a member of segment \
                                     '{segment_id}'"
                                ),
                            ));
                        }
                    }
                }
                None => findings.push(Suggestion::blocking(
                    format!("{} -> {}", link.source, link.target),
                    format!("link references unknown segment '{segment_id}'"),
                )),
            }
        }
    }

    findings
}
