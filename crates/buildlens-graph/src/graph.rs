use crate::config::SearchConfig;
use crate::executor::{Executor, RunMode, Task};
use crate::node::{FileKind, Node, RecordContext};
use buildlens_core::path::{normalize_separators, path_key, split_folder_file};
use buildlens_types::{CompileRecord, RecordSink};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*(?:"([^"]+)"|<([^>]+)>)"#).unwrap());

/// A non-fatal condition hit while resolving. Unresolvable or unreadable
/// files prune only their own branch; the run always continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveIssue {
    RootMissing { path: String },
    Unreadable { path: String },
    HeaderNotFound { include: String, referenced_from: String },
}

impl fmt::Display for ResolveIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveIssue::RootMissing { path } => write!(f, "file '{}' not found", path),
            ResolveIssue::Unreadable { path } => write!(f, "could not open file '{}'", path),
            ResolveIssue::HeaderNotFound {
                include,
                referenced_from,
            } => write!(
                f,
                "failed to find header '{}' included from '{}'",
                include, referenced_from
            ),
        }
    }
}

/// Registry of file nodes plus the pending-work collection. Created once per
/// run; callers must invoke [`DependencyGraph::finish_work`] before reading
/// final node state.
pub struct DependencyGraph {
    nodes: Mutex<HashMap<u64, Arc<Node>>>,
    pending: Mutex<Vec<Task>>,
    issues: Mutex<Vec<ResolveIssue>>,
    executor: Executor,
    scans: AtomicU64,
}

impl DependencyGraph {
    pub fn new(mode: RunMode) -> Arc<Self> {
        Arc::new(Self {
            nodes: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            issues: Mutex::new(Vec::new()),
            executor: Executor::new(mode),
            scans: AtomicU64::new(0),
        })
    }

    /// Case-insensitive lookup-or-insert. Concurrent callers for the same
    /// path receive the same instance. The kind is fixed by the first caller.
    pub fn get_or_create(&self, path: &str, kind: FileKind) -> Arc<Node> {
        let name = normalize_separators(path);
        let key = path_key(&name);
        let mut nodes = self.nodes.lock().unwrap();
        Arc::clone(
            nodes
                .entry(key)
                .or_insert_with(|| Arc::new(Node::new(key, name, kind))),
        )
    }

    pub fn get(&self, path: &str) -> Option<Arc<Node>> {
        let key = path_key(&normalize_separators(path));
        self.nodes.lock().unwrap().get(&key).map(Arc::clone)
    }

    /// Start resolving the closure of a root file. An unopenable root is an
    /// issue with no scheduled work. Returns immediately; the traversal
    /// completes when [`DependencyGraph::finish_work`] returns.
    pub fn process_includes(
        self: &Arc<Self>,
        path: &str,
        config: Arc<SearchConfig>,
        ctx: Arc<RecordContext>,
    ) {
        let name = normalize_separators(path);
        if !Path::new(&name).is_file() {
            self.report(ResolveIssue::RootMissing { path: name });
            return;
        }
        let node = self.get_or_create(&name, FileKind::Source);
        self.process_node(node, config, ctx);
    }

    fn process_node(
        self: &Arc<Self>,
        node: Arc<Node>,
        config: Arc<SearchConfig>,
        ctx: Arc<RecordContext>,
    ) {
        // Already scanned under an equivalent config: every directive in the
        // file resolves to the same headers, so nothing can change.
        if !node.try_claim(&config, &ctx) {
            return;
        }
        self.scans.fetch_add(1, Ordering::Relaxed);

        let file = match File::open(node.name()) {
            Ok(file) => file,
            Err(_) => {
                self.report(ResolveIssue::Unreadable {
                    path: node.name().to_string(),
                });
                return;
            }
        };

        let (folder, _) = split_folder_file(node.name());
        let mut scheduled = Vec::new();
        for line in BufReader::new(file).lines() {
            let Ok(line) = line else { break };
            let Some((include, quoted)) = parse_include_directive(&line) else {
                continue;
            };
            let Some(resolved) = config.find_header(include, quoted) else {
                // May be guarded by an undefined macro or be
                // compiler-intrinsic; skip the branch.
                self.report(ResolveIssue::HeaderNotFound {
                    include: include.to_string(),
                    referenced_from: node.name().to_string(),
                });
                continue;
            };

            let other = self.get_or_create(&resolved, FileKind::Header);
            node.add_dep(other.key());

            let (other_folder, _) = split_folder_file(other.name());
            let next_config = if other_folder == folder {
                Arc::clone(&config)
            } else {
                config.with_parent(&other_folder)
            };

            let graph = Arc::clone(self);
            let next_ctx = Arc::clone(&ctx);
            scheduled.push(self.executor.submit(Box::new(move || {
                graph.process_node(other, next_config, next_ctx);
            })));
        }

        self.pending.lock().unwrap().extend(scheduled);
    }

    /// The single synchronization barrier. Completing a task can enqueue
    /// further tasks, so drain repeatedly until a drain comes up empty.
    pub fn finish_work(&self) {
        loop {
            let batch: Vec<Task> = {
                let mut pending = self.pending.lock().unwrap();
                pending.drain(..).collect()
            };
            if batch.is_empty() {
                return;
            }
            for task in batch {
                task.wait();
            }
        }
    }

    /// Number of actual file scans performed. Two configs with equal hash
    /// account for one scan per file; differing hashes scan again.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    /// All nodes, sorted by path for deterministic output.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        let mut nodes: Vec<Arc<Node>> = self.nodes.lock().unwrap().values().cloned().collect();
        nodes.sort_by(|a, b| a.name().cmp(b.name()));
        nodes
    }

    pub fn issues(&self) -> Vec<ResolveIssue> {
        self.issues.lock().unwrap().clone()
    }

    /// Emit one record per discovered node, in path order, skipping paths
    /// the sink already knows. Call after [`DependencyGraph::finish_work`].
    pub fn flush(&self, sink: &mut dyn RecordSink) {
        for node in self.nodes() {
            let Some(ctx) = node.context() else { continue };
            if sink.contains(node.name()) {
                continue;
            }
            sink.insert(CompileRecord {
                file_path: node.name().to_string(),
                project_name: ctx.project_name.clone(),
                project_file: ctx.project_file.clone(),
                defines: ctx.defines.clone(),
                user_includes: ctx.user_includes.clone(),
                system_includes: ctx.system_includes.clone(),
            });
        }
    }

    fn report(&self, issue: ResolveIssue) {
        self.issues.lock().unwrap().push(issue);
    }
}

/// Match a leading-whitespace `#include` directive. Returns the include name
/// and whether it used the quoted form. Textual matching only; conditional
/// compilation around the directive is invisible here.
fn parse_include_directive(line: &str) -> Option<(&str, bool)> {
    let captures = INCLUDE_RE.captures(line)?;
    if let Some(quoted) = captures.get(1) {
        return Some((quoted.as_str(), true));
    }
    captures.get(2).map(|angled| (angled.as_str(), false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_include_directive_forms() {
        assert_eq!(
            parse_include_directive("#include \"foo.h\""),
            Some(("foo.h", true))
        );
        assert_eq!(
            parse_include_directive("  #  include   <vector>"),
            Some(("vector", false))
        );
        assert_eq!(
            parse_include_directive("\t#include <sub/dir.h> // trailing"),
            Some(("sub/dir.h", false))
        );
        assert_eq!(parse_include_directive("// #include \"foo.h\""), None);
        assert_eq!(parse_include_directive("#define FOO"), None);
    }

    #[test]
    fn test_get_or_create_is_case_insensitive() {
        let graph = DependencyGraph::new(RunMode::Deferred);
        let a = graph.get_or_create("C:\\Inc\\A.h", FileKind::Header);
        let b = graph.get_or_create("c:/inc/a.h", FileKind::Header);
        assert_eq!(a.key(), b.key());
        assert_eq!(graph.node_count(), 1);
        // First caller fixes the stored name
        assert_eq!(a.name(), "C:/Inc/A.h");
    }

    #[test]
    fn test_missing_root_reports_issue_without_work() {
        let graph = DependencyGraph::new(RunMode::Deferred);
        let config = SearchConfig::new(vec![], vec![]);
        let ctx = Arc::new(RecordContext {
            project_name: "demo".to_string(),
            project_file: "demo.vcxproj".to_string(),
            defines: vec![],
            user_includes: vec![],
            system_includes: vec![],
        });
        graph.process_includes("/no/such/file.cpp", config, ctx);
        graph.finish_work();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(
            graph.issues(),
            vec![ResolveIssue::RootMissing {
                path: "/no/such/file.cpp".to_string()
            }]
        );
    }
}
