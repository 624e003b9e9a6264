use crate::config::SearchConfig;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Header,
}

/// Project context a node was first discovered under. Headers inherit the
/// defines and include dirs of the compile that reached them first.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub project_name: String,
    pub project_file: String,
    pub defines: Vec<String>,
    pub user_includes: Vec<String>,
    pub system_includes: Vec<String>,
}

/// A source or header file tracked by the resolver. Identity is the 64-bit
/// hash of the case-folded path; the registry guarantees one instance per
/// path. Mutable state sits behind a per-node mutex so unrelated nodes never
/// contend.
#[derive(Debug)]
pub struct Node {
    key: u64,
    name: String,
    kind: FileKind,
    state: Mutex<NodeState>,
}

#[derive(Debug, Default)]
struct NodeState {
    /// Configs this file was already scanned under, keyed by config hash.
    processed: HashMap<u64, Arc<SearchConfig>>,
    /// Keys of nodes this file includes, directly. Grows only.
    deps: HashSet<u64>,
    /// Captured once, from the first processing.
    context: Option<Arc<RecordContext>>,
}

impl Node {
    pub(crate) fn new(key: u64, name: String, kind: FileKind) -> Self {
        Self {
            key,
            name,
            kind,
            state: Mutex::new(NodeState::default()),
        }
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Atomic check-and-insert of a config into the processed set; captures
    /// the record context on first claim. Returns false when this
    /// (node, config-hash) pair was already processed, which guarantees
    /// at-most-once scanning across all concurrently running tasks.
    pub(crate) fn try_claim(&self, config: &Arc<SearchConfig>, ctx: &Arc<RecordContext>) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.processed.contains_key(&config.hash()) {
            return false;
        }
        state.processed.insert(config.hash(), Arc::clone(config));
        if state.context.is_none() {
            state.context = Some(Arc::clone(ctx));
        }
        true
    }

    /// Idempotent dependency insert.
    pub(crate) fn add_dep(&self, key: u64) {
        self.state.lock().unwrap().deps.insert(key);
    }

    pub fn deps(&self) -> Vec<u64> {
        let mut deps: Vec<u64> = self.state.lock().unwrap().deps.iter().copied().collect();
        deps.sort_unstable();
        deps
    }

    pub fn context(&self) -> Option<Arc<RecordContext>> {
        self.state.lock().unwrap().context.clone()
    }
}
