use buildlens_types::{DiagnosticKind, DiagnosticSet};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io;

/// Print the deduplicated diagnostics to stderr, MSVC-style, with a closing
/// tally. Colors only when stderr is a terminal.
pub fn print_diagnostics(diags: &DiagnosticSet) {
    if diags.is_empty() {
        return;
    }
    let color = io::stderr().is_terminal();

    for diag in diags.iter() {
        let location = if diag.line > 0 {
            format!("{}({})", diag.file, diag.line)
        } else {
            diag.file.clone()
        };
        let label = match (diag.kind, color) {
            (DiagnosticKind::Error, true) => "error".red().bold().to_string(),
            (DiagnosticKind::Error, false) => "error".to_string(),
            (DiagnosticKind::Warning, true) => "warning".yellow().to_string(),
            (DiagnosticKind::Warning, false) => "warning".to_string(),
        };
        eprintln!("{}: {} {}: {}", location, label, diag.code, diag.message);
    }

    let errors = diags
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Error)
        .count();
    eprintln!("{} error(s), {} warning(s)", errors, diags.len() - errors);
}
