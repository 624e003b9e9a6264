// Shared data model: compile records, diagnostics, and the sink seam
// between the log parser / include resolver and the persistence layer.

pub mod diagnostic;
pub mod record;

pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSet};
pub use record::{CompileRecord, MemoryStore, RecordSink};
