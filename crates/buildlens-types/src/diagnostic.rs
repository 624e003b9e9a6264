use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

/// A compiler or build-tool diagnostic extracted from log output.
///
/// Command-line diagnostics carry no source location; they store their
/// context string in `file` with `line = 0` so the dedup key stays uniform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub kind: DiagnosticKind,
    pub code: String,
    pub message: String,
}

/// Insertion-ordered diagnostic collection deduplicated by
/// `(file, line, code)`. The first occurrence wins; repeats from parallel
/// build workers re-reporting the same failure are dropped.
#[derive(Debug, Default)]
pub struct DiagnosticSet {
    seen: HashSet<(String, u32, String)>,
    items: Vec<Diagnostic>,
}

impl DiagnosticSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the diagnostic was newly inserted.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        let key = (diag.file.clone(), diag.line, diag.code.clone());
        if !self.seen.insert(key) {
            return false;
        }
        self.items.push(diag);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
