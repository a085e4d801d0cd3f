//! Process-area extraction from equipment and instrument tags.
//!
//! Area codes are 3-4 digit groups carried either at the head of an
//! equipment tag (`200-P-01`) or embedded after the ISA function letters of
//! an instrument tag (`PIT-200-01`). The same extraction is used on every
//! path so equipment and instruments land in the same area buckets.

use regex::Regex;
use std::sync::OnceLock;

/// Bucket used when a tag carries no recognizable area code.
pub const FALLBACK_AREA: &str = "000";

fn leading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{3,4})").expect("valid area regex"))
}

fn embedded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]+-(\d{3,4})-").expect("valid area regex"))
}

/// Extract the area code from a tag, if one is present.
pub fn try_extract_area(tag: &str) -> Option<String> {
    if let Some(caps) = leading_re().captures(tag) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = embedded_re().captures(tag) {
        return Some(caps[1].to_string());
    }
    None
}

/// Extract the area code from a tag, falling back to [`FALLBACK_AREA`].
pub fn extract_area(tag: &str) -> String {
    try_extract_area(tag).unwrap_or_else(|| FALLBACK_AREA.to_string())
}
