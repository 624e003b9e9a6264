// Concurrent include-dependency resolver.
//
// Given a root file and a search configuration, discovers the transitive
// header closure by scanning for `#include` directives and resolving each
// one the way the compiler's search order would. Files are never scanned
// twice under an equivalent configuration (hash-keyed memoization), and
// continuations run either deferred on the waiting thread or on a worker
// pool, selected per run.

mod config;
mod executor;
mod graph;
mod node;

pub use config::SearchConfig;
pub use executor::RunMode;
pub use graph::{DependencyGraph, ResolveIssue};
pub use node::{FileKind, Node, RecordContext};
