//! One-shot bootstrap orchestration.
//!
//! Ties the pipeline together: extraction, aggregation, template
//! resolution, allocation, assembly. A single invocation is one
//! synchronous unit of work over an immutable snapshot of its inputs;
//! re-running with identical inputs and policy produces a value-identical
//! result (same ids, same ordering, same digest).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::AllocationEngine;
use crate::assemble::TopologyAssembler;
use crate::digest::canonical_digest;
use crate::equipment::{extract_equipment, RawEquipmentRecord};
use crate::error::{CsaError, Result};
use crate::io::{aggregate_signals, IoCounts, RawIoSignal};
use crate::suggestion::{any_at_least, Mode, Severity, Suggestion};
use crate::template::{PolicyOverrides, TemplateRegistry};
use crate::topology::Topology;

/// Caller-facing knobs for one bootstrap invocation.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub project: String,
    pub template: String,
    pub template_version: String,
    pub mode: Mode,
    pub overrides: PolicyOverrides,
}

impl BootstrapOptions {
    /// Defaults: `centralized` template at version "1.0", lenient mode,
    /// no overrides.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            template: "centralized".to_string(),
            template_version: "1.0".to_string(),
            mode: Mode::Lenient,
            overrides: PolicyOverrides::new(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.template = name.into();
        self.template_version = version.into();
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_overrides(mut self, overrides: PolicyOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Everything one bootstrap run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// The assembled draft topology.
    pub topology: Topology,

    /// Every decision made under ambiguity, verbatim.
    pub suggestions: Vec<Suggestion>,

    /// Recognized signal counts per area.
    pub io_summary: BTreeMap<String, IoCounts>,

    /// Remote I/O module count per area (override-adjusted).
    pub rio_modules: BTreeMap<String, u32>,

    /// Equipment tag to governing controller id.
    pub equipment_mapping: BTreeMap<String, String>,

    /// Canonical SHA-256 digest of the topology.
    pub digest: String,

    pub template_used: String,
    pub template_version: String,
}

/// Run the full bootstrap pipeline.
///
/// # Errors
///
/// - [`CsaError::MalformedEquipmentRecord`] — uninterpretable input;
///   always fatal regardless of mode.
/// - [`CsaError::UnknownTemplate`] — unregistered name/version pair;
///   always fatal.
/// - [`CsaError::AllocationRejected`] — strict mode only: the suggestion
///   list contains at least one WARNING or BLOCKING entry. The error
///   carries the complete list so the caller keeps the diagnostic trail.
pub fn bootstrap(
    registry: &TemplateRegistry,
    raw_equipment: &[RawEquipmentRecord],
    raw_signals: &[RawIoSignal],
    options: &BootstrapOptions,
) -> Result<BootstrapResult> {
    info!(
        project = %options.project,
        template = %options.template,
        version = %options.template_version,
        mode = ?options.mode,
        "bootstrap started"
    );

    let resolved = registry.resolve(
        &options.template,
        &options.template_version,
        &options.overrides,
        options.mode,
    )?;
    let mut suggestions = resolved.suggestions;

    let extraction = extract_equipment(raw_equipment)?;
    suggestions.extend(extraction.suggestions);

    let io = aggregate_signals(raw_signals);
    suggestions.extend(io.suggestions.clone());

    if extraction.records.is_empty() {
        suggestions.push(Suggestion::warning(
            options.project.clone(),
            "no equipment records found in the equipment list",
        ));
    }
    if raw_signals.is_empty() {
        suggestions.push(Suggestion::warning(
            options.project.clone(),
            "no signal records found in the instrument database",
        ));
    }

    let alloc = AllocationEngine::run(&extraction.records, &io, &resolved.policy);
    suggestions.extend(alloc.suggestions.clone());

    let (topology, findings) = TopologyAssembler::assemble(&options.project, &alloc);
    suggestions.extend(findings);

    if options.mode == Mode::Strict && any_at_least(&suggestions, Severity::Warning) {
        info!(
            project = %options.project,
            suggestions = suggestions.len(),
            "bootstrap rejected in strict mode"
        );
        return Err(CsaError::AllocationRejected { suggestions });
    }

    let digest = canonical_digest(&topology)?;

    info!(
        project = %options.project,
        controllers = topology.controllers.len(),
        devices = topology.devices.len(),
        links = topology.links.len(),
        suggestions = suggestions.len(),
        "bootstrap complete"
    );

    Ok(BootstrapResult {
        topology,
        suggestions,
        io_summary: io.per_area,
        rio_modules: alloc.rio_modules,
        equipment_mapping: alloc.equipment_mapping,
        digest,
        template_used: options.template.clone(),
        template_version: options.template_version.clone(),
    })
}
