//! Equipment list extraction.
//!
//! Normalizes loosely-structured equipment-list records into
//! [`EquipmentRecord`]s. Extraction is permissive: enumeration casing is
//! preserved exactly as given and unknown feeder types pass through
//! verbatim — judgment on them happens in the allocation engine. The only
//! hard failures here are records that cannot be interpreted at all
//! (missing tag, underivable area, duplicate tag).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CsaError, Result};
use crate::suggestion::Suggestion;
use crate::tag;

/// Known feeder classes, resolved from the case-insensitive shadow key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeederClass {
    Dol,
    Vfd,
    SoftStarter,
    VendorPackage,
    None,
    /// Token did not match any known class; the raw value is preserved on
    /// the record and flagged by the allocation engine.
    Unknown,
}

/// How an electrical load is driven.
///
/// Open-valued: the stored token keeps the exact casing it arrived with
/// (`"SOFT-STARTER"` stays `"SOFT-STARTER"`). Matching happens on a
/// case-insensitive shadow key that also folds `-` to `_`, never on the
/// stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeederType(String);

impl FeederType {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The feeder token exactly as given upstream.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify via the shadow key.
    pub fn class(&self) -> FeederClass {
        let key = self.0.trim().to_ascii_uppercase().replace('-', "_");
        match key.as_str() {
            "DOL" => FeederClass::Dol,
            "VFD" => FeederClass::Vfd,
            "SOFT_STARTER" => FeederClass::SoftStarter,
            "VENDOR_PACKAGE" => FeederClass::VendorPackage,
            "NONE" | "" => FeederClass::None,
            _ => FeederClass::Unknown,
        }
    }
}

/// Who owns control of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlResponsibility {
    Plc,
    Vendor,
    Manual,
}

/// Record kind: plain equipment or a vendor-supplied package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EquipmentKind {
    Equipment,
    Package,
}

/// A normalized equipment-list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    /// Unique tag, e.g. `200-B-01`.
    pub tag: String,

    /// Feeder token as given upstream (open-valued).
    pub feeder_type: FeederType,

    pub control_responsibility: ControlResponsibility,

    /// Process-area code, e.g. `200`.
    pub area: String,

    pub kind: EquipmentKind,
}

impl EquipmentRecord {
    /// True when the record is vendor-controlled, regardless of kind.
    pub fn is_vendor(&self) -> bool {
        self.control_responsibility == ControlResponsibility::Vendor
    }
}

/// Area code as it appears upstream: numeric or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawArea {
    Number(u64),
    Text(String),
}

impl RawArea {
    fn normalize(&self) -> Option<String> {
        match self {
            RawArea::Number(n) => Some(n.to_string()),
            RawArea::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// A raw equipment-list entry before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEquipmentRecord {
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub feeder_type: Option<String>,

    #[serde(default)]
    pub control_responsibility: Option<String>,

    #[serde(default)]
    pub area: Option<RawArea>,

    #[serde(default)]
    pub kind: Option<String>,
}

/// Equipment list input: either a sequence of records or a mapping from
/// tag to record fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEquipmentList {
    List(Vec<RawEquipmentRecord>),
    Map(BTreeMap<String, RawEquipmentRecord>),
}

impl RawEquipmentList {
    /// Flatten to a sequence, filling tags from map keys where absent.
    pub fn into_records(self) -> Vec<RawEquipmentRecord> {
        match self {
            RawEquipmentList::List(records) => records,
            RawEquipmentList::Map(map) => map
                .into_iter()
                .map(|(key, mut record)| {
                    if record.tag.is_none() {
                        record.tag = Some(key);
                    }
                    record
                })
                .collect(),
        }
    }
}

/// Output of equipment extraction: the ordered record sequence plus any
/// extraction-level advisories (extraction stays permissive, so these are
/// never fatal).
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    pub records: Vec<EquipmentRecord>,
    pub suggestions: Vec<Suggestion>,
}

/// Normalize raw equipment-list records.
///
/// # Errors
///
/// - [`CsaError::MalformedEquipmentRecord`] — a record lacks a tag, lacks
///   an area (and none is derivable from the tag), or repeats a tag
///   already seen in the set.
pub fn extract_equipment(raw: &[RawEquipmentRecord]) -> Result<ExtractionOutput> {
    let mut out = ExtractionOutput::default();
    let mut seen_tags: BTreeSet<String> = BTreeSet::new();

    for (index, record) in raw.iter().enumerate() {
        let tag = match record.tag.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                return Err(CsaError::MalformedEquipmentRecord {
                    index,
                    reason: "missing tag".to_string(),
                })
            }
        };

        if !seen_tags.insert(tag.clone()) {
            return Err(CsaError::MalformedEquipmentRecord {
                index,
                reason: format!("duplicate tag '{tag}'"),
            });
        }

        let area = match record.area.as_ref().and_then(RawArea::normalize) {
            Some(area) => area,
            None => match tag::try_extract_area(&tag) {
                Some(area) => area,
                None => {
                    return Err(CsaError::MalformedEquipmentRecord {
                        index,
                        reason: format!("missing area and tag '{tag}' carries no area code"),
                    })
                }
            },
        };

        let feeder_type = FeederType::new(record.feeder_type.as_deref().unwrap_or("NONE"));

        let control_responsibility = match record.control_responsibility.as_deref() {
            Option::None => ControlResponsibility::Plc,
            Some(raw_resp) => match raw_resp.trim().to_ascii_uppercase().as_str() {
                "PLC" | "" => ControlResponsibility::Plc,
                "VENDOR" => ControlResponsibility::Vendor,
                "MANUAL" => ControlResponsibility::Manual,
                other => {
                    out.suggestions.push(
                        Suggestion::warning(
                            tag.clone(),
                            format!("unrecognized control_responsibility '{other}', assumed PLC"),
                        )
                        .with_resolution("set control_responsibility to PLC, VENDOR, or MANUAL"),
                    );
                    ControlResponsibility::Plc
                }
            },
        };

        let kind = match record.kind.as_deref() {
            Option::None => EquipmentKind::Equipment,
            Some(raw_kind) => match raw_kind.trim().to_ascii_uppercase().as_str() {
                "PACKAGE" => EquipmentKind::Package,
                "EQUIPMENT" | "" => EquipmentKind::Equipment,
                other => {
                    out.suggestions.push(Suggestion::warning(
                        tag.clone(),
                        format!("unrecognized kind '{other}', assumed EQUIPMENT"),
                    ));
                    EquipmentKind::Equipment
                }
            },
        };

        out.records.push(EquipmentRecord {
            tag,
            feeder_type,
            control_responsibility,
            area,
            kind,
        });
    }

    Ok(out)
}
