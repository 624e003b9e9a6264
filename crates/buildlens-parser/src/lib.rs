// Build-log state machine.
//
// Demultiplexes interleaved parallel-build output into per-project parsers,
// reconstructs the exact compiler invocation (defines, include paths,
// compiled files) for every translation unit, and collects deduplicated
// compiler diagnostics. Purely textual: no macro interpretation, no C/C++
// lexing.

mod diagnostics;
mod invocation;
mod log;
mod project;

pub use log::LogParser;
pub use project::ProjectParser;
