//! SQLite persistence for compile records, keyed by a stable hash of the
//! case-folded file path so re-indexing a build updates rows in place.

mod db;

pub use db::{Database, FileEntry};
