//! Review suggestions emitted during bootstrap.
//!
//! Every decision the engine makes under ambiguity becomes a [`Suggestion`]
//! so a human reviewer can accept or correct it. Suggestions are never
//! auto-resolved; they are surfaced verbatim to the caller.

use serde::{Deserialize, Serialize};

/// Severity level for a suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Blocking,
}

/// Validation mode for a bootstrap invocation.
///
/// Strict mode converts unresolved ambiguity into a hard failure; lenient
/// mode always completes and returns the accumulated suggestions alongside
/// the best-effort topology.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Strict,
    Lenient,
}

/// A single human-review item produced during allocation or assembly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    /// Severity level.
    pub severity: Severity,

    /// Equipment tag or area the suggestion refers to.
    pub subject: String,

    /// Human-readable description of the ambiguity or substitution.
    pub message: String,

    /// Suggested fix, when one can be stated.
    pub proposed_resolution: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(severity: Severity, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            subject: subject.into(),
            message: message.into(),
            proposed_resolution: None,
        }
    }

    /// INFO-level suggestion.
    pub fn info(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, subject, message)
    }

    /// WARNING-level suggestion.
    pub fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, subject, message)
    }

    /// BLOCKING-level suggestion.
    pub fn blocking(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Blocking, subject, message)
    }

    /// Attach a proposed resolution.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.proposed_resolution = Some(resolution.into());
        self
    }
}

/// Comma-separated list of the distinct subjects in a suggestion set.
///
/// Used by strict-mode failure messages so the caller sees exactly which
/// tags and areas triggered the rejection.
pub fn subjects(suggestions: &[Suggestion]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for s in suggestions {
        if !seen.contains(&s.subject.as_str()) {
            seen.push(&s.subject);
        }
    }
    seen.join(", ")
}

/// True when any suggestion meets or exceeds the given severity.
pub fn any_at_least(suggestions: &[Suggestion], severity: Severity) -> bool {
    suggestions.iter().any(|s| s.severity >= severity)
}
