//! Error taxonomy for CSA bootstrap.
//!
//! Extraction-level errors (malformed input, unknown template) abort
//! immediately. Allocation-level ambiguity never aborts silently: in
//! lenient mode it travels as suggestions, in strict mode it is promoted
//! to a single aggregate [`CsaError::AllocationRejected`] carrying the
//! full suggestion list.

use crate::suggestion::{subjects, Suggestion};

/// CSA bootstrap errors.
#[derive(Debug, thiserror::Error)]
pub enum CsaError {
    #[error("malformed equipment record at index {index}: {reason}")]
    MalformedEquipmentRecord { index: usize, reason: String },

    #[error("unknown template: {name} (version {version})")]
    UnknownTemplate { name: String, version: String },

    #[error(
        "strict bootstrap rejected: {} unresolved suggestion(s) affecting [{}]",
        .suggestions.len(),
        subjects(.suggestions)
    )]
    AllocationRejected { suggestions: Vec<Suggestion> },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for CSA bootstrap operations.
pub type Result<T> = std::result::Result<T, CsaError>;
