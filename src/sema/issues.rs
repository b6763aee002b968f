// src/sema/issues.rs

use std::fmt;

use crate::ast::SourceLocation;

/// Diagnostic severity. Only `Error` blocks the checked AST from being
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Deprecation,
}

/// A user-facing diagnostic accumulated during a check.
///
/// Issues appear in resolver visit order (post-order of the AST), which is
/// stable for a given input.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
}

impl Issue {
    pub fn error(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            location,
            message: message.into(),
        }
    }

    pub fn warning(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Information => "INFORMATION",
            Severity::Deprecation => "DEPRECATION",
        };
        write!(f, "{}: {}: {}", tag, self.location, self.message)
    }
}
