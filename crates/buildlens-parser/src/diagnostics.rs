//! Recognition of MSVC diagnostic lines.

use buildlens_types::{Diagnostic, DiagnosticKind};
use once_cell::sync::Lazy;
use regex::Regex;

// C:\src\a.cpp(42): error C2065: 'x': undeclared identifier
static SOURCE_DIAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.+?)\((\d+)\)\s*:\s*(fatal error|error|warning)\s+([A-Za-z]+\d+)\s*:\s*(.*)$")
        .unwrap()
});

// cl : Command line warning D9002 : ignoring unknown option '/foo'
static COMMAND_LINE_DIAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.+?)\s*:\s*Command line (error|warning)\s+([A-Za-z]+\d+)\s*:\s*(.*)$")
        .unwrap()
});

/// Parse a line as a compiler diagnostic, if it is one. Command-line
/// diagnostics have no source location; the reporting tool name stands in
/// for the file and the line number is zero.
pub(crate) fn extract(line: &str) -> Option<Diagnostic> {
    if let Some(caps) = SOURCE_DIAG_RE.captures(line) {
        let severity = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        return Some(Diagnostic {
            file: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            line: caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
            kind: if severity == "warning" {
                DiagnosticKind::Warning
            } else {
                DiagnosticKind::Error
            },
            code: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
            message: caps.get(5).map(|m| m.as_str().to_string()).unwrap_or_default(),
        });
    }

    if let Some(caps) = COMMAND_LINE_DIAG_RE.captures(line) {
        return Some(Diagnostic {
            file: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            line: 0,
            kind: if caps.get(2).map(|m| m.as_str()) == Some("warning") {
                DiagnosticKind::Warning
            } else {
                DiagnosticKind::Error
            },
            code: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
            message: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
        });
    }

    None
}
