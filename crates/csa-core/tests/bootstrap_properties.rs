//! End-to-end bootstrap behavior over the public API.

use csa_core::bootstrap::{bootstrap, BootstrapOptions};
use csa_core::equipment::{RawArea, RawEquipmentRecord};
use csa_core::io::RawIoSignal;
use csa_core::suggestion::{Mode, Severity};
use csa_core::template::{PolicyOverrides, TemplateRegistry};
use csa_core::topology::ControllerType;
use csa_core::CsaError;

fn equipment(tag: &str, feeder: &str, resp: &str, area: &str) -> RawEquipmentRecord {
    RawEquipmentRecord {
        tag: Some(tag.to_string()),
        feeder_type: Some(feeder.to_string()),
        control_responsibility: Some(resp.to_string()),
        area: Some(RawArea::Text(area.to_string())),
        kind: None,
    }
}

fn package(tag: &str, area: &str) -> RawEquipmentRecord {
    RawEquipmentRecord {
        tag: Some(tag.to_string()),
        feeder_type: Some("VENDOR_PACKAGE".to_string()),
        control_responsibility: Some("VENDOR".to_string()),
        area: Some(RawArea::Text(area.to_string())),
        kind: Some("PACKAGE".to_string()),
    }
}

fn signal(tag: &str, io_type: &str, count: u32) -> RawIoSignal {
    RawIoSignal {
        equipment_tag: tag.to_string(),
        io_type: io_type.to_string(),
        count,
    }
}

fn two_area_plant() -> (Vec<RawEquipmentRecord>, Vec<RawIoSignal>) {
    let records = vec![
        equipment("200-B-01", "VFD", "PLC", "200"),
        equipment("300-P-01", "DOL", "PLC", "300"),
    ];
    let signals = vec![
        signal("200-B-01", "DI", 3),
        signal("200-B-01", "DO", 1),
        signal("200-B-01", "AI", 1),
        signal("200-B-01", "AO", 1),
        signal("300-P-01", "DI", 2),
        signal("300-P-01", "DO", 1),
    ];
    (records, signals)
}

#[test]
fn test_fully_distributed_two_area_scenario() {
    let registry = TemplateRegistry::builtin();
    let (records, signals) = two_area_plant();

    let mut overrides = PolicyOverrides::new();
    overrides.insert("spare_io_pct".to_string(), serde_json::json!(20));
    let options = BootstrapOptions::new("demo-plant")
        .with_template("fully_distributed", "1.0")
        .with_overrides(overrides);

    let result = bootstrap(&registry, &records, &signals, &options).expect("bootstrap");

    // No ambiguity in this input: the suggestion list is empty.
    assert!(
        result.suggestions.is_empty(),
        "unexpected suggestions: {:?}",
        result.suggestions
    );

    let controller_ids: Vec<&str> = result
        .topology
        .controllers
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(controller_ids, vec!["PLC-200", "PLC-300"]);

    let vfd = result
        .topology
        .get_device("VFD-200-B-01")
        .expect("vfd device");
    assert_eq!(vfd.parent_controller.as_deref(), Some("PLC-200"));
    assert_eq!(result.equipment_mapping["200-B-01"], "PLC-200");

    // 6 signals at 20% spare over 16-point modules: one module.
    assert_eq!(result.rio_modules["200"], 1);
    assert_eq!(result.io_summary["200"].values().sum::<u32>(), 6);
}

#[test]
fn test_bootstrap_is_deterministic() {
    let registry = TemplateRegistry::builtin();
    let (records, signals) = two_area_plant();
    let options = BootstrapOptions::new("demo-plant").with_template("fully_distributed", "1.0");

    let first = bootstrap(&registry, &records, &signals, &options).expect("first run");
    let second = bootstrap(&registry, &records, &signals, &options).expect("second run");

    assert_eq!(first.digest, second.digest);
    assert_eq!(
        serde_json::to_string(&first.topology).expect("serialize"),
        serde_json::to_string(&second.topology).expect("serialize")
    );
    assert_eq!(first.suggestions, second.suggestions);
    assert_eq!(first.equipment_mapping, second.equipment_mapping);
}

#[test]
fn test_remote_io_module_conservation() {
    let registry = TemplateRegistry::builtin();
    let records = vec![equipment("200-B-01", "VFD", "PLC", "200")];
    let signals = vec![signal("200-B-01", "DI", 40), signal("200-B-01", "AI", 8)];

    // fully_distributed defaults: 25% spare, 16-point modules.
    // 48 signals * 1.25 = 60 points -> 4 modules.
    let options = BootstrapOptions::new("plant").with_template("fully_distributed", "1.0");
    let result = bootstrap(&registry, &records, &signals, &options).expect("bootstrap");
    assert_eq!(result.rio_modules["200"], 4);

    // A panel_count override replaces the computed value exactly.
    let mut overrides = PolicyOverrides::new();
    overrides.insert("panel_counts".to_string(), serde_json::json!({"200": 7}));
    let options = BootstrapOptions::new("plant")
        .with_template("fully_distributed", "1.0")
        .with_overrides(overrides);
    let result = bootstrap(&registry, &records, &signals, &options).expect("bootstrap");
    assert_eq!(result.rio_modules["200"], 7);
    assert!(result
        .suggestions
        .iter()
        .any(|s| s.severity == Severity::Info && s.message.contains("override")));
}

#[test]
fn test_vendor_duality_holds_across_templates() {
    let registry = TemplateRegistry::builtin();
    let records = vec![
        equipment("200-B-01", "VFD", "PLC", "200"),
        package("400-MBR-01", "400"),
        package("500-RO-01", "500"),
    ];
    let signals = vec![
        signal("200-B-01", "DI", 2),
        signal("400-MBR-01", "DI", 4),
        signal("400-MBR-01", "DO", 2),
        signal("500-RO-01", "DI", 3),
        signal("500-RO-01", "DO", 1),
    ];

    for template in ["centralized", "fully_distributed", "vendor_package_integration"] {
        let options = BootstrapOptions::new("plant").with_template(template, "1.0");
        let result = bootstrap(&registry, &records, &signals, &options).expect("bootstrap");

        let vendor_ids: Vec<&str> = result
            .topology
            .controllers
            .iter()
            .filter(|c| c.controller_type == ControllerType::VendorPlc)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(
            vendor_ids,
            vec!["PKG-400-MBR-01", "PKG-500-RO-01"],
            "template {template}"
        );

        for id in vendor_ids {
            let touching = result.topology.links_for_node(id);
            assert_eq!(touching.len(), 2, "template {template}, package {id}");
            let tokens: Vec<&str> = touching.iter().map(|l| l.protocol.token()).collect();
            assert!(tokens.contains(&"OPC_UA"));
            assert!(tokens.contains(&"Hardwired"));
        }
    }
}

#[test]
fn test_mode_contrast_on_unknown_feeder_type() {
    let registry = TemplateRegistry::builtin();
    let records = vec![
        equipment("200-B-01", "VFD", "PLC", "200"),
        equipment("200-P-07", "HYDRAULIC", "PLC", "200"),
    ];
    let signals = vec![signal("200-B-01", "DI", 2), signal("200-P-07", "DI", 1)];

    let lenient = BootstrapOptions::new("plant").with_template("centralized", "1.0");
    let result = bootstrap(&registry, &records, &signals, &lenient).expect("lenient completes");
    assert_eq!(result.suggestions.len(), 1);
    assert_eq!(result.suggestions[0].severity, Severity::Warning);
    assert_eq!(result.suggestions[0].subject, "200-P-07");
    assert_eq!(result.topology.controllers.len(), 1);

    let strict = BootstrapOptions::new("plant")
        .with_template("centralized", "1.0")
        .with_mode(Mode::Strict);
    let err = bootstrap(&registry, &records, &signals, &strict).unwrap_err();
    match err {
        CsaError::AllocationRejected { suggestions } => {
            assert_eq!(suggestions.len(), 1);
            assert_eq!(suggestions[0].subject, "200-P-07");
        }
        other => panic!("expected AllocationRejected, got {other:?}"),
    }
    // The rendered failure names the offending tag, not just "failed".
    let strict = BootstrapOptions::new("plant")
        .with_template("centralized", "1.0")
        .with_mode(Mode::Strict);
    let err = bootstrap(&registry, &records, &signals, &strict).unwrap_err();
    assert!(err.to_string().contains("200-P-07"));
}

#[test]
fn test_shape_distinction_centralized_vs_distributed() {
    let registry = TemplateRegistry::builtin();
    let (records, signals) = two_area_plant();

    let central = BootstrapOptions::new("plant").with_template("centralized", "1.0");
    let result = bootstrap(&registry, &records, &signals, &central).expect("bootstrap");
    assert_eq!(result.topology.controllers.len(), 1);
    assert_eq!(result.topology.controllers[0].id, "PLC-001");
    assert_eq!(result.topology.controllers[0].equipment_tags.len(), 2);

    let distributed = BootstrapOptions::new("plant").with_template("fully_distributed", "1.0");
    let result = bootstrap(&registry, &records, &signals, &distributed).expect("bootstrap");
    let plc_ids: Vec<&str> = result
        .topology
        .controllers
        .iter()
        .filter(|c| c.controller_type == ControllerType::Plc)
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(plc_ids, vec!["PLC-200", "PLC-300"]);
}

#[test]
fn test_hybrid_safety_has_one_shared_safety_plc() {
    let registry = TemplateRegistry::builtin();
    let (records, signals) = two_area_plant();
    let options = BootstrapOptions::new("plant").with_template("hybrid_safety", "1.0");
    let result = bootstrap(&registry, &records, &signals, &options).expect("bootstrap");

    let safety: Vec<_> = result
        .topology
        .controllers
        .iter()
        .filter(|c| c.controller_type == ControllerType::SafetyPlc)
        .collect();
    assert_eq!(safety.len(), 1);
    assert_eq!(safety[0].id, "SIS-001");
    assert_eq!(safety[0].zone, "level_1");
}

#[test]
fn test_malformed_equipment_aborts_in_any_mode() {
    let registry = TemplateRegistry::builtin();
    let records = vec![RawEquipmentRecord::default()];

    for mode in [Mode::Lenient, Mode::Strict] {
        let options = BootstrapOptions::new("plant").with_mode(mode);
        let err = bootstrap(&registry, &records, &[], &options).unwrap_err();
        assert!(matches!(err, CsaError::MalformedEquipmentRecord { .. }));
    }
}

#[test]
fn test_topology_round_trips_through_json() {
    let registry = TemplateRegistry::builtin();
    let (records, signals) = two_area_plant();
    let options = BootstrapOptions::new("plant").with_template("fully_distributed", "1.0");
    let result = bootstrap(&registry, &records, &signals, &options).expect("bootstrap");

    let json = serde_json::to_string(&result.topology).expect("serialize");
    // Fixed wire tokens survive serialization.
    assert!(json.contains("\"RemoteIO\""));
    assert!(json.contains("\"Profinet\""));
    assert!(json.contains("\"PLC\""));

    let back: csa_core::topology::Topology = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, result.topology);
}
