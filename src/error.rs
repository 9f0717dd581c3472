//! Error types shared across the crate.

use std::fmt;

use thiserror::Error;

/// A single schema violation, addressed by a JSON-path-like location such
/// as `personalInfo.email` or `experiences[2].startDate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in a candidate document, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resume failed validation with {} violation(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// True when some violation is reported at exactly `path`.
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures of a single export call. None of them outlive the call: the
/// exporter logs them, notifies the user and reports `false`.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export target `{0}` not found")]
    NotFound(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("an export of `{0}` is already in progress")]
    Conflict(String),

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the local persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                FieldViolation::new("personalInfo.email", "Invalid email address"),
                FieldViolation::new("experiences[0].company", "Company name is required"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 violation(s)"));
        assert!(msg.contains("personalInfo.email: Invalid email address"));
        assert!(msg.contains("experiences[0].company"));
        assert!(err.has_violation_at("personalInfo.email"));
        assert!(!err.has_violation_at("personalInfo"));
    }
}
