//! Instrument I/O aggregation.
//!
//! Collapses raw per-signal records into one [`IoSignalSummary`] per
//! equipment tag plus an area-level roll-up used for module sizing.
//! Unknown io_type tokens are counted into a separate `other` bucket and
//! reported as a WARNING — never dropped silently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::suggestion::Suggestion;
use crate::tag;

/// The closed set of recognized I/O signal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IoType {
    #[serde(rename = "DI")]
    Di,
    #[serde(rename = "DO")]
    Do,
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "AO")]
    Ao,
    #[serde(rename = "PI")]
    Pi,
    #[serde(rename = "PO")]
    Po,
}

impl IoType {
    pub const ALL: [IoType; 6] = [
        IoType::Di,
        IoType::Do,
        IoType::Ai,
        IoType::Ao,
        IoType::Pi,
        IoType::Po,
    ];

    /// Wire token, e.g. `"DI"`.
    pub fn token(&self) -> &'static str {
        match self {
            IoType::Di => "DI",
            IoType::Do => "DO",
            IoType::Ai => "AI",
            IoType::Ao => "AO",
            IoType::Pi => "PI",
            IoType::Po => "PO",
        }
    }

    /// Case-insensitive parse; `None` for tokens outside the closed set.
    pub fn parse(raw: &str) -> Option<IoType> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DI" => Some(IoType::Di),
            "DO" => Some(IoType::Do),
            "AI" => Some(IoType::Ai),
            "AO" => Some(IoType::Ao),
            "PI" => Some(IoType::Pi),
            "PO" => Some(IoType::Po),
            _ => None,
        }
    }
}

/// Per-io_type counts, always carrying all six types.
pub type IoCounts = BTreeMap<IoType, u32>;

/// A counts map with every recognized type present at zero.
pub fn zero_counts() -> IoCounts {
    IoType::ALL.iter().map(|io| (*io, 0)).collect()
}

/// Sum across all six recognized types.
pub fn total_signals(counts: &IoCounts) -> u32 {
    counts.values().sum()
}

/// A raw instrument-database record: one signal line.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIoSignal {
    pub equipment_tag: String,

    pub io_type: String,

    /// Signal count carried by this record; a bare signal line counts 1.
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// Aggregated I/O signal counts for one equipment tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSignalSummary {
    pub equipment_tag: String,

    /// Counts per recognized io_type (all six always present).
    pub counts: IoCounts,

    /// Signals whose io_type fell outside the recognized set.
    pub other: u32,
}

impl IoSignalSummary {
    /// All-zero summary for a tag absent from the instrument database.
    pub fn empty(equipment_tag: impl Into<String>) -> Self {
        Self {
            equipment_tag: equipment_tag.into(),
            counts: zero_counts(),
            other: 0,
        }
    }

    /// Total recognized signals for this tag.
    pub fn total(&self) -> u32 {
        total_signals(&self.counts)
    }

    /// Discrete channels usable as hardwired interlocks.
    pub fn interlock_channels(&self) -> u32 {
        self.counts.get(&IoType::Di).copied().unwrap_or(0)
            + self.counts.get(&IoType::Do).copied().unwrap_or(0)
    }
}

/// Aggregated instrument-database view: per-tag summaries, per-area
/// roll-up, and the advisories collected along the way.
#[derive(Debug, Clone, Default)]
pub struct IoAggregation {
    pub per_equipment: BTreeMap<String, IoSignalSummary>,
    pub per_area: BTreeMap<String, IoCounts>,
    pub suggestions: Vec<Suggestion>,
}

impl IoAggregation {
    /// Summary for a tag; absent tags yield an all-zero summary, never an
    /// error.
    pub fn summary_for(&self, equipment_tag: &str) -> IoSignalSummary {
        self.per_equipment
            .get(equipment_tag)
            .cloned()
            .unwrap_or_else(|| IoSignalSummary::empty(equipment_tag))
    }

    /// Area counts; absent areas yield all-zero counts.
    pub fn area_counts(&self, area: &str) -> IoCounts {
        self.per_area.get(area).cloned().unwrap_or_else(zero_counts)
    }
}

/// Aggregate raw signal records into per-tag and per-area summaries.
pub fn aggregate_signals(signals: &[RawIoSignal]) -> IoAggregation {
    let mut agg = IoAggregation::default();
    let mut flagged_unknown: Vec<(String, String)> = Vec::new();

    for signal in signals {
        let equipment_tag = signal.equipment_tag.trim().to_string();
        let area = tag::extract_area(&equipment_tag);

        let summary = agg
            .per_equipment
            .entry(equipment_tag.clone())
            .or_insert_with(|| IoSignalSummary::empty(equipment_tag.clone()));

        match IoType::parse(&signal.io_type) {
            Some(io_type) => {
                *summary.counts.entry(io_type).or_insert(0) += signal.count;
                let area_counts = agg.per_area.entry(area).or_insert_with(zero_counts);
                *area_counts.entry(io_type).or_insert(0) += signal.count;
            }
            None => {
                summary.other += signal.count;
                let token = signal.io_type.trim().to_string();
                let key = (equipment_tag.clone(), token.clone());
                if !flagged_unknown.contains(&key) {
                    flagged_unknown.push(key);
                    agg.suggestions.push(
                        Suggestion::warning(
                            equipment_tag.clone(),
                            format!("unrecognized io_type '{token}' counted into 'other' bucket"),
                        )
                        .with_resolution("reclassify as one of DI|DO|AI|AO|PI|PO"),
                    );
                }
            }
        }
    }

    agg
}
