use crate::diagnostics;
use crate::project::ProjectParser;
use buildlens_graph::DependencyGraph;
use buildlens_types::{DiagnosticSet, RecordSink};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

static PREAMBLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(1>)?Project "[^"]+" on node 1\b"#).unwrap());
static WORKER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)>(.*)$").unwrap());
static BEGIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*rem vim-vs-begin: ProjectName="([^"]+)", ProjectPath="([^"]+)", IncludePath=(.*)$"#)
        .unwrap()
});
static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*rem vim-vs-end: ProjectName="([^"]+)"\s*$"#).unwrap());

/// Incremental parser for a whole MSBuild log.
///
/// The log interleaves output of parallel build workers, each line tagged
/// with an `N>` prefix; a prefix is only printed when the active worker
/// changes, so the last seen number is sticky. Project begin/end markers
/// open and close one [`ProjectParser`] per worker. Input arrives in
/// arbitrary chunks (stdin pipes cut lines anywhere) and any of LF, CR or
/// CRLF terminates a line.
pub struct LogParser {
    parsers: HashMap<u32, ProjectParser>,
    current_worker: u32,
    multi_process: bool,
    started: bool,
    partial: String,
    diagnostics: DiagnosticSet,
    inconsistencies: Vec<String>,
    compiler_exe: String,
    graph: Option<Arc<DependencyGraph>>,
}

impl LogParser {
    pub fn new(compiler_exe: impl Into<String>) -> Self {
        Self {
            parsers: HashMap::new(),
            current_worker: 0,
            multi_process: false,
            started: false,
            partial: String::new(),
            diagnostics: DiagnosticSet::new(),
            inconsistencies: Vec::new(),
            compiler_exe: compiler_exe.into(),
            graph: None,
        }
    }

    /// Attach a dependency graph: every compiled file additionally has its
    /// include closure resolved under the invocation's search directories.
    pub fn with_graph(mut self, graph: Arc<DependencyGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Consume a chunk of log text. Chunk boundaries need not align with
    /// line boundaries.
    pub fn feed(&mut self, chunk: &str, sink: &mut dyn RecordSink) {
        for ch in chunk.chars() {
            if ch == '\n' || ch == '\r' {
                if !self.partial.is_empty() {
                    let line = mem::take(&mut self.partial);
                    self.parse_line(&line, sink);
                }
            } else {
                self.partial.push(ch);
            }
        }
    }

    /// Flush a trailing unterminated line and close any project that never
    /// saw its end marker.
    pub fn finish(&mut self, sink: &mut dyn RecordSink) {
        if !self.partial.is_empty() {
            let line = mem::take(&mut self.partial);
            self.parse_line(&line, sink);
        }
        for parser in self.parsers.values_mut() {
            if !parser.is_finished() {
                self.inconsistencies.push(format!(
                    "project '{}' was still open at end of log",
                    parser.name()
                ));
                parser.finish();
            }
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticSet {
        &self.diagnostics
    }

    /// Log-shape violations encountered so far. Never fatal: the parser
    /// keeps extracting whatever it can.
    pub fn inconsistencies(&self) -> &[String] {
        &self.inconsistencies
    }

    fn parse_line(&mut self, line: &str, sink: &mut dyn RecordSink) {
        if !self.started {
            if let Some(caps) = PREAMBLE_RE.captures(line) {
                // A worker prefix on the very first project line means
                // MSBuild runs multi-process and every line is tagged.
                self.multi_process = caps.get(1).is_some();
                self.started = true;
                if self.multi_process {
                    self.current_worker = 1;
                }
            }
            return;
        }

        let body = match WORKER_PREFIX_RE.captures(line) {
            Some(caps) => {
                if let Some(worker) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                    self.current_worker = worker;
                }
                caps.get(2).map(|m| m.as_str()).unwrap_or("")
            }
            None => line,
        };

        if let Some(diag) = diagnostics::extract(body) {
            self.diagnostics.push(diag);
            return;
        }

        if let Some(caps) = BEGIN_RE.captures(body) {
            self.begin_project(&caps);
            return;
        }
        if let Some(caps) = END_RE.captures(body) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            self.end_project(name);
            return;
        }

        if let Some(parser) = self.parsers.get_mut(&self.current_worker)
            && !parser.is_finished()
            && let Some(fault) = parser.parse_line(body, sink)
        {
            self.inconsistencies.push(fault);
        }
    }

    fn begin_project(&mut self, caps: &regex::Captures<'_>) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let path = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let include_path = caps.get(3).map(|m| m.as_str()).unwrap_or("");

        // Single-process logs carry no worker prefixes; give each project
        // a synthetic worker so sequential projects stay separated.
        if !self.multi_process {
            self.current_worker += 1;
        }
        if let Some(previous) = self.parsers.get(&self.current_worker)
            && !previous.is_finished()
        {
            self.inconsistencies.push(format!(
                "project '{}' began on worker {} while '{}' was still open",
                name,
                self.current_worker,
                previous.name()
            ));
        }
        let parser = ProjectParser::new(
            name,
            path,
            include_path,
            &self.compiler_exe,
            self.graph.clone(),
        );
        self.parsers.insert(self.current_worker, parser);
    }

    fn end_project(&mut self, name: &str) {
        match self.parsers.get_mut(&self.current_worker) {
            Some(parser) => {
                if parser.name() != name {
                    self.inconsistencies.push(format!(
                        "end marker for '{}' on worker {} while '{}' was active",
                        name,
                        self.current_worker,
                        parser.name()
                    ));
                }
                parser.finish();
            }
            None => self.inconsistencies.push(format!(
                "end marker for '{}' on worker {} with no active project",
                name, self.current_worker
            )),
        }
    }
}
