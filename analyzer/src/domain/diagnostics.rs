//! Diagnostic values and the sink they are delivered to
//!
//! Diagnostics are pure data: a kind (stable id, severity, message template),
//! the call-site location and the template arguments. Rendering and delivery
//! belong to whoever implements [`DiagnosticSink`].

use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;
use regex::{Captures, Regex};
use serde::Serialize;

use super::callsite::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Every diagnostic the analysis can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    SqlValidationFailed,
    ValidationFailedUnexpectedly,
    MissingParameters,
    UnusedParameters,
    ParameterTypeMismatch,
    ExpectedSingleColumn,
    SingleColumnTypeMismatch,
    MissingColumns,
    UnusedColumns,
    ColumnTypeMismatch,
}

impl DiagnosticKind {
    pub fn id(&self) -> &'static str {
        match self {
            Self::SqlValidationFailed => "SQLA001",
            Self::ValidationFailedUnexpectedly => "SQLA002",
            Self::MissingParameters => "SQLA003",
            Self::UnusedParameters => "SQLA004",
            Self::ParameterTypeMismatch => "SQLA005",
            Self::ExpectedSingleColumn => "SQLA006",
            Self::SingleColumnTypeMismatch => "SQLA007",
            Self::MissingColumns => "SQLA008",
            Self::UnusedColumns => "SQLA009",
            Self::ColumnTypeMismatch => "SQLA010",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ValidationFailedUnexpectedly | Self::UnusedParameters | Self::UnusedColumns => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    /// Message template with positional `{0}`, `{1}`, ... placeholders
    pub fn template(&self) -> &'static str {
        match self {
            Self::SqlValidationFailed => "SQL query is invalid:\n{0}",
            Self::ValidationFailedUnexpectedly => "Failed to validate SQL query: {0}",
            Self::MissingParameters => "Query parameters are not supplied:\n{0}",
            Self::UnusedParameters => "Supplied parameters are not used by the query:\n{0}",
            Self::ParameterTypeMismatch => {
                "Parameter '{0}' has type {2} but the query expects {1}"
            }
            Self::ExpectedSingleColumn => {
                "Query must return exactly one column to map to {0}"
            }
            Self::SingleColumnTypeMismatch => "Query column of type {0} cannot be mapped to {1}",
            Self::MissingColumns => "Expected fields are not returned by the query:\n{0}",
            Self::UnusedColumns => "Query columns are not mapped to any field:\n{0}",
            Self::ColumnTypeMismatch => {
                "Column '{0}' has type {1} which cannot be mapped to {2}"
            }
        }
    }
}

/// One diagnostic reported at a call site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: SourceLocation,
    pub arguments: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: &SourceLocation, arguments: Vec<String>) -> Self {
        Self {
            kind,
            location: location.clone(),
            arguments,
        }
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Template with arguments substituted
    pub fn message(&self) -> String {
        static RE_PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = RE_PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("Invalid regex"));

        re.replace_all(self.kind.template(), |captures: &Captures<'_>| {
            captures[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| self.arguments.get(i))
                .cloned()
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location,
            self.severity(),
            self.id(),
            self.message()
        )
    }
}

/// Receiver of diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::trace!(id = diagnostic.id(), location = %diagnostic.location, "Diagnostic reported");
        self.diagnostics.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> SourceLocation {
        SourceLocation {
            file_path: "src/orders.cs".to_string(),
            span_start: 42,
            span_length: 10,
            line: 3,
            column: 5,
        }
    }

    #[test]
    fn test_message_substitution() {
        let d = Diagnostic::new(
            DiagnosticKind::ParameterTypeMismatch,
            &location(),
            vec!["p1".into(), "int?".into(), "string".into()],
        );
        assert_eq!(
            d.message(),
            "Parameter 'p1' has type string but the query expects int?"
        );
    }

    #[test]
    fn test_arguments_are_not_resubstituted() {
        let d = Diagnostic::new(
            DiagnosticKind::ParameterTypeMismatch,
            &location(),
            vec!["{1}".into(), "int?".into(), "{0}".into()],
        );
        assert_eq!(
            d.message(),
            "Parameter '{1}' has type {0} but the query expects int?"
        );
    }

    #[test]
    fn test_missing_argument_keeps_placeholder() {
        let d = Diagnostic::new(
            DiagnosticKind::ParameterTypeMismatch,
            &location(),
            vec!["p1".into()],
        );
        assert_eq!(d.message(), "Parameter 'p1' has type {2} but the query expects {1}");
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::new(
            DiagnosticKind::UnusedColumns,
            &location(),
            vec!["Extra".into()],
        );
        assert_eq!(
            d.to_string(),
            "src/orders.cs:3:5: warning[SQLA009]: Query columns are not mapped to any field:\nExtra"
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let kinds = [
            DiagnosticKind::SqlValidationFailed,
            DiagnosticKind::ValidationFailedUnexpectedly,
            DiagnosticKind::MissingParameters,
            DiagnosticKind::UnusedParameters,
            DiagnosticKind::ParameterTypeMismatch,
            DiagnosticKind::ExpectedSingleColumn,
            DiagnosticKind::SingleColumnTypeMismatch,
            DiagnosticKind::MissingColumns,
            DiagnosticKind::UnusedColumns,
            DiagnosticKind::ColumnTypeMismatch,
        ];
        let ids: std::collections::HashSet<_> = kinds.iter().map(|k| k.id()).collect();
        assert_eq!(ids.len(), kinds.len());
    }

    #[test]
    fn test_collector() {
        let sink = DiagnosticCollector::new();
        sink.report(Diagnostic::new(
            DiagnosticKind::SqlValidationFailed,
            &location(),
            vec!["Invalid column name 'x'".into()],
        ));
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(sink.into_diagnostics()[0].severity(), Severity::Error);
    }
}
