//! Architecture template registry and allocation policy resolution.
//!
//! Templates are named, versioned allocation policies loaded once at
//! process start and treated as append-only thereafter. Resolution is a
//! pure structural merge: template defaults × caller overrides → a fresh
//! [`AllocationPolicy`], never a mutation of the stored template.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CsaError, Result};
use crate::suggestion::{Mode, Severity, Suggestion};
use crate::topology::ProtocolType;

/// The closed set of topology shapes a template can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyShape {
    Centralized,
    CentralMccDistributedIo,
    FullyDistributed,
    HybridSafety,
    VendorPackageIntegration,
}

/// Where plant PLCs live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlcPlacement {
    Central,
    PerArea,
}

/// Where variable-frequency drives are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VfdPlacement {
    Mcc,
    RemotePanel,
}

/// Where I/O modules are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoPlacement {
    Central,
    Distributed,
}

/// Safety PLC allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPlcPlacement {
    None,
    Central,
}

/// Vendor package integration style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorIntegration {
    None,
    OpcUa,
}

/// Controller classes a policy can configure independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerClass {
    Plc,
    SafetyPlc,
    VendorPlc,
}

/// Per-class sizing and redundancy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerClassSettings {
    /// I/O points one module of this class terminates.
    pub module_capacity: u32,
    pub redundant: bool,
}

impl Default for ControllerClassSettings {
    fn default() -> Self {
        Self {
            module_capacity: DEFAULT_MODULE_CAPACITY,
            redundant: false,
        }
    }
}

/// Default points per I/O module when a class does not override it.
pub const DEFAULT_MODULE_CAPACITY: u32 = 16;

/// A resolved allocation policy: one template's defaults with caller
/// overrides merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPolicy {
    pub template_name: String,
    pub template_version: String,
    pub description: String,
    pub use_case: String,

    pub topology_shape: TopologyShape,
    pub plc_placement: PlcPlacement,
    pub vfd_placement: VfdPlacement,
    pub io_placement: IoPlacement,
    pub safety_plc: SafetyPlcPlacement,
    pub vendor_integration: VendorIntegration,

    /// Protocols in preference order; the first one a device supports wins.
    pub protocol_preferences: Vec<ProtocolType>,

    /// Spare I/O capacity percentage, 0-100.
    pub spare_io_pct: u8,

    pub controller_classes: BTreeMap<ControllerClass, ControllerClassSettings>,

    /// Per-area panel-count overrides; an entry replaces the computed
    /// module count outright.
    pub panel_count_overrides: BTreeMap<String, u32>,
}

impl AllocationPolicy {
    /// Settings for a controller class, falling back to the class default.
    pub fn class_settings(&self, class: ControllerClass) -> ControllerClassSettings {
        self.controller_classes
            .get(&class)
            .copied()
            .unwrap_or_default()
    }
}

/// Summary row returned by [`TemplateRegistry::list_templates`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub name: String,
    pub version: String,
    pub topology_shape: TopologyShape,
    pub description: String,
    pub use_case: String,
    pub primary_protocol: ProtocolType,
}

/// Caller-supplied policy overrides, keyed by option name.
pub type PolicyOverrides = BTreeMap<String, Value>;

/// A resolved policy plus the advisories produced while merging overrides.
#[derive(Debug, Clone)]
pub struct ResolvedPolicy {
    pub policy: AllocationPolicy,
    pub suggestions: Vec<Suggestion>,
}

/// Named, versioned allocation policies.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<(String, String), AllocationPolicy>,
}

impl TemplateRegistry {
    /// Registry with the five builtin templates, all at version "1.0".
    pub fn builtin() -> Self {
        let mut registry = Self {
            templates: BTreeMap::new(),
        };
        for template in builtin_templates() {
            registry.register(template);
        }
        registry
    }

    /// Register a template. Administrative operation; must not run
    /// concurrently with an in-flight resolve.
    pub fn register(&mut self, template: AllocationPolicy) {
        let key = (
            template.template_name.clone(),
            template.template_version.clone(),
        );
        self.templates.insert(key, template);
    }

    /// Look up a template by name and version.
    pub fn get(&self, name: &str, version: &str) -> Option<&AllocationPolicy> {
        self.templates
            .get(&(name.to_string(), version.to_string()))
    }

    /// Registry contents for introspection. Pure read.
    pub fn list_templates(&self) -> Vec<TemplateSummary> {
        self.templates
            .values()
            .map(|t| TemplateSummary {
                name: t.template_name.clone(),
                version: t.template_version.clone(),
                topology_shape: t.topology_shape,
                description: t.description.clone(),
                use_case: t.use_case.clone(),
                primary_protocol: t
                    .protocol_preferences
                    .first()
                    .copied()
                    .unwrap_or(ProtocolType::EthernetIp),
            })
            .collect()
    }

    /// Resolve a template name/version plus overrides into a concrete
    /// policy.
    ///
    /// Override fields merge field-by-field: present replaces the default,
    /// absent retains it. Unknown override keys are BLOCKING in strict
    /// mode and WARNING in lenient mode — never silently ignored.
    ///
    /// # Errors
    ///
    /// [`CsaError::UnknownTemplate`] when the name/version pair is not
    /// registered.
    pub fn resolve(
        &self,
        name: &str,
        version: &str,
        overrides: &PolicyOverrides,
        mode: Mode,
    ) -> Result<ResolvedPolicy> {
        let template = self.get(name, version).ok_or_else(|| CsaError::UnknownTemplate {
            name: name.to_string(),
            version: version.to_string(),
        })?;

        let mut policy = template.clone();
        let mut suggestions = Vec::new();
        let bad_override_severity = match mode {
            Mode::Strict => Severity::Blocking,
            Mode::Lenient => Severity::Warning,
        };

        for (key, value) in overrides {
            match key.as_str() {
                "spare_io_pct" => match value.as_u64() {
                    Some(pct) if pct <= 100 => policy.spare_io_pct = pct as u8,
                    _ => suggestions.push(invalid_value(
                        bad_override_severity,
                        name,
                        key,
                        "an integer in 0..=100",
                    )),
                },
                "panel_counts" => match parse_panel_counts(value) {
                    Some(counts) => policy.panel_count_overrides.extend(counts),
                    None => suggestions.push(invalid_value(
                        bad_override_severity,
                        name,
                        key,
                        "a map of area code to panel count",
                    )),
                },
                "protocol_preferences" => match parse_protocols(value) {
                    Some(protocols) if !protocols.is_empty() => {
                        policy.protocol_preferences = protocols
                    }
                    _ => suggestions.push(invalid_value(
                        bad_override_severity,
                        name,
                        key,
                        "a non-empty list of protocol tokens",
                    )),
                },
                "redundancy" => match parse_class_map::<bool>(value) {
                    Some(flags) => {
                        for (class, redundant) in flags {
                            policy
                                .controller_classes
                                .entry(class)
                                .or_default()
                                .redundant = redundant;
                        }
                    }
                    None => suggestions.push(invalid_value(
                        bad_override_severity,
                        name,
                        key,
                        "a map of controller class to bool",
                    )),
                },
                "module_capacity" => match parse_class_map::<u32>(value) {
                    Some(capacities) => {
                        for (class, capacity) in capacities {
                            if capacity == 0 {
                                suggestions.push(invalid_value(
                                    bad_override_severity,
                                    name,
                                    key,
                                    "a non-zero module capacity",
                                ));
                                continue;
                            }
                            policy
                                .controller_classes
                                .entry(class)
                                .or_default()
                                .module_capacity = capacity;
                        }
                    }
                    None => suggestions.push(invalid_value(
                        bad_override_severity,
                        name,
                        key,
                        "a map of controller class to capacity",
                    )),
                },
                unknown => {
                    suggestions.push(
                        Suggestion::new(
                            bad_override_severity,
                            name,
                            format!("unknown override key '{unknown}'"),
                        )
                        .with_resolution(
                            "use one of spare_io_pct, panel_counts, protocol_preferences, \
                             redundancy, module_capacity",
                        ),
                    );
                }
            }
        }

        Ok(ResolvedPolicy {
            policy,
            suggestions,
        })
    }
}

fn invalid_value(severity: Severity, template: &str, key: &str, expected: &str) -> Suggestion {
    Suggestion::new(
        severity,
        template,
        format!("override '{key}' has an invalid value, expected {expected}; default retained"),
    )
}

fn parse_panel_counts(value: &Value) -> Option<BTreeMap<String, u32>> {
    let object = value.as_object()?;
    let mut counts = BTreeMap::new();
    for (area, count) in object {
        let count = count.as_u64()?;
        counts.insert(area.clone(), u32::try_from(count).ok()?);
    }
    Some(counts)
}

fn parse_protocols(value: &Value) -> Option<Vec<ProtocolType>> {
    let entries = value.as_array()?;
    let mut protocols = Vec::with_capacity(entries.len());
    for entry in entries {
        protocols.push(serde_json::from_value(entry.clone()).ok()?);
    }
    Some(protocols)
}

fn parse_class_map<T: serde::de::DeserializeOwned>(
    value: &Value,
) -> Option<BTreeMap<ControllerClass, T>> {
    let object = value.as_object()?;
    let mut map = BTreeMap::new();
    for (class, entry) in object {
        let class: ControllerClass =
            serde_json::from_value(Value::String(class.clone())).ok()?;
        map.insert(class, serde_json::from_value(entry.clone()).ok()?);
    }
    Some(map)
}

fn class_settings(
    entries: &[(ControllerClass, u32, bool)],
) -> BTreeMap<ControllerClass, ControllerClassSettings> {
    entries
        .iter()
        .map(|(class, module_capacity, redundant)| {
            (
                *class,
                ControllerClassSettings {
                    module_capacity: *module_capacity,
                    redundant: *redundant,
                },
            )
        })
        .collect()
}

fn builtin_templates() -> Vec<AllocationPolicy> {
    vec![
        AllocationPolicy {
            template_name: "centralized".to_string(),
            template_version: "1.0".to_string(),
            description: "Central MCC + central PLC, all VFDs and I/O in one location".to_string(),
            use_case: "Small plants, compact footprint, short cable runs".to_string(),
            topology_shape: TopologyShape::Centralized,
            plc_placement: PlcPlacement::Central,
            vfd_placement: VfdPlacement::Mcc,
            io_placement: IoPlacement::Central,
            safety_plc: SafetyPlcPlacement::None,
            vendor_integration: VendorIntegration::None,
            protocol_preferences: vec![ProtocolType::EthernetIp, ProtocolType::Profinet],
            spare_io_pct: 20,
            controller_classes: class_settings(&[
                (ControllerClass::Plc, 16, false),
                (ControllerClass::SafetyPlc, 16, false),
                (ControllerClass::VendorPlc, 16, false),
            ]),
            panel_count_overrides: BTreeMap::new(),
        },
        AllocationPolicy {
            template_name: "central_mcc_distributed_io".to_string(),
            template_version: "1.0".to_string(),
            description: "Central MCC with remote I/O panels at process areas".to_string(),
            use_case: "Medium plants, moderate cable distances".to_string(),
            topology_shape: TopologyShape::CentralMccDistributedIo,
            plc_placement: PlcPlacement::PerArea,
            vfd_placement: VfdPlacement::Mcc,
            io_placement: IoPlacement::Distributed,
            safety_plc: SafetyPlcPlacement::None,
            vendor_integration: VendorIntegration::None,
            protocol_preferences: vec![ProtocolType::EthernetIp, ProtocolType::Profinet],
            spare_io_pct: 20,
            controller_classes: class_settings(&[
                (ControllerClass::Plc, 16, true),
                (ControllerClass::SafetyPlc, 16, false),
                (ControllerClass::VendorPlc, 16, false),
            ]),
            panel_count_overrides: BTreeMap::new(),
        },
        AllocationPolicy {
            template_name: "fully_distributed".to_string(),
            template_version: "1.0".to_string(),
            description: "Remote panels per area with VFDs, starters, and I/O".to_string(),
            use_case: "Large plants, long distances, modular expansion".to_string(),
            topology_shape: TopologyShape::FullyDistributed,
            plc_placement: PlcPlacement::PerArea,
            vfd_placement: VfdPlacement::RemotePanel,
            io_placement: IoPlacement::Distributed,
            safety_plc: SafetyPlcPlacement::None,
            vendor_integration: VendorIntegration::None,
            protocol_preferences: vec![ProtocolType::Profinet, ProtocolType::EthernetIp],
            spare_io_pct: 25,
            controller_classes: class_settings(&[
                (ControllerClass::Plc, 16, true),
                (ControllerClass::SafetyPlc, 16, false),
                (ControllerClass::VendorPlc, 16, false),
            ]),
            panel_count_overrides: BTreeMap::new(),
        },
        AllocationPolicy {
            template_name: "hybrid_safety".to_string(),
            template_version: "1.0".to_string(),
            description: "Central safety PLC + distributed process control".to_string(),
            use_case: "Plants with SIL requirements, ESD/SIS functions".to_string(),
            topology_shape: TopologyShape::HybridSafety,
            plc_placement: PlcPlacement::PerArea,
            vfd_placement: VfdPlacement::RemotePanel,
            io_placement: IoPlacement::Distributed,
            safety_plc: SafetyPlcPlacement::Central,
            vendor_integration: VendorIntegration::None,
            protocol_preferences: vec![ProtocolType::Profinet],
            spare_io_pct: 25,
            controller_classes: class_settings(&[
                (ControllerClass::Plc, 16, true),
                (ControllerClass::SafetyPlc, 16, true),
                (ControllerClass::VendorPlc, 16, false),
            ]),
            panel_count_overrides: BTreeMap::new(),
        },
        AllocationPolicy {
            template_name: "vendor_package_integration".to_string(),
            template_version: "1.0".to_string(),
            description: "OEM packages with vendor PLCs integrated via OPC-UA".to_string(),
            use_case: "Plants with multiple vendor packages (MBR, RO, DAF)".to_string(),
            topology_shape: TopologyShape::VendorPackageIntegration,
            plc_placement: PlcPlacement::Central,
            vfd_placement: VfdPlacement::RemotePanel,
            io_placement: IoPlacement::Distributed,
            safety_plc: SafetyPlcPlacement::None,
            vendor_integration: VendorIntegration::OpcUa,
            protocol_preferences: vec![ProtocolType::EthernetIp, ProtocolType::OpcUa],
            spare_io_pct: 20,
            controller_classes: class_settings(&[
                (ControllerClass::Plc, 16, true),
                (ControllerClass::SafetyPlc, 16, false),
                (ControllerClass::VendorPlc, 16, false),
            ]),
            panel_count_overrides: BTreeMap::new(),
        },
    ]
}
