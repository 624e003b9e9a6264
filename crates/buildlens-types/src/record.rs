use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One reconstructed compiler invocation for a single translation unit or
/// header file. Defines and include directories keep the order they carried
/// on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRecord {
    /// Canonical absolute path of the compiled file or discovered header.
    pub file_path: String,
    pub project_name: String,
    /// Path of the project file this record was extracted from.
    pub project_file: String,
    pub defines: Vec<String>,
    pub user_includes: Vec<String>,
    pub system_includes: Vec<String>,
}

impl CompileRecord {
    /// Defines joined for the database column: `-DFOO=1|-DBAR`.
    pub fn defines_column(&self) -> String {
        self.defines
            .iter()
            .map(|d| format!("-D{}", d))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Includes joined for the database column, system dirs first:
    /// `-isystemC:/vs/include|-IC:/proj/inc`.
    pub fn includes_column(&self) -> String {
        self.system_includes
            .iter()
            .map(|d| format!("-isystem{}", d))
            .chain(self.user_includes.iter().map(|d| format!("-I{}", d)))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Arguments in clang order for compile_commands.json emission.
    pub fn clang_arguments(&self) -> Vec<String> {
        self.system_includes
            .iter()
            .map(|d| format!("-isystem{}", d))
            .chain(self.defines.iter().map(|d| format!("-D{}", d)))
            .chain(self.user_includes.iter().map(|d| format!("-I{}", d)))
            .collect()
    }
}

/// Destination for compile records. Lookups are case-insensitive because the
/// records describe Windows paths.
pub trait RecordSink {
    fn contains(&self, file_path: &str) -> bool;

    /// Insert a record. A record for an already-known path is a no-op.
    fn insert(&mut self, record: CompileRecord);
}

/// In-memory sink preserving insertion order. Used by tests and by the CLI
/// when no database path is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    by_path: HashMap<String, usize>,
    records: Vec<CompileRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_path: &str) -> Option<&CompileRecord> {
        self.by_path
            .get(&file_path.to_lowercase())
            .map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[CompileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSink for MemoryStore {
    fn contains(&self, file_path: &str) -> bool {
        self.by_path.contains_key(&file_path.to_lowercase())
    }

    fn insert(&mut self, record: CompileRecord) {
        let key = record.file_path.to_lowercase();
        if self.by_path.contains_key(&key) {
            return;
        }
        self.by_path.insert(key, self.records.len());
        self.records.push(record);
    }
}
