use crate::invocation;
use buildlens_core::path::{absolutize, normalize_separators, split_folder_file};
use buildlens_graph::{DependencyGraph, RecordContext, SearchConfig};
use buildlens_types::{CompileRecord, RecordSink};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static INCLUDE_NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Note: including file:\s*(.*?)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    ClCompile,
    Finished,
}

/// Parser for the log lines of one project on one build worker. Lines before
/// the `ClCompile:` section header are skipped; within the section, compiler
/// invocations produce one record per compiled file and `/showIncludes`
/// notes attach headers to the invocation that preceded them.
pub struct ProjectParser {
    state: State,
    project_name: String,
    project_file: String,
    project_dir: String,
    system_includes: Vec<String>,
    compiler_exe: String,
    /// Context of the most recent compiler invocation, shared with the
    /// dependency graph and with include-note records.
    current: Option<Arc<RecordContext>>,
    graph: Option<Arc<DependencyGraph>>,
}

impl ProjectParser {
    /// `include_path` is the raw semicolon-separated IncludePath property.
    pub fn new(
        project_name: &str,
        project_path: &str,
        include_path: &str,
        compiler_exe: &str,
        graph: Option<Arc<DependencyGraph>>,
    ) -> Self {
        let project_file = normalize_separators(project_path);
        let (project_dir, _) = split_folder_file(&project_file);
        let system_includes = include_path
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| absolutize(&normalize_separators(d), &project_dir))
            .collect();
        Self {
            state: State::Initial,
            project_name: project_name.to_string(),
            project_file,
            project_dir,
            system_includes,
            compiler_exe: compiler_exe.to_string(),
            current: None,
            graph,
        }
    }

    pub fn name(&self) -> &str {
        &self.project_name
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Terminal. Further lines routed here are dropped by the caller.
    pub fn finish(&mut self) {
        self.state = State::Finished;
    }

    /// Consume one prefix-stripped line. Returns an inconsistency message
    /// when the line contradicts the expected log shape.
    pub fn parse_line(&mut self, line: &str, sink: &mut dyn RecordSink) -> Option<String> {
        match self.state {
            State::Finished => None,
            State::Initial => {
                if line.trim() == "ClCompile:" {
                    self.state = State::ClCompile;
                }
                None
            }
            State::ClCompile => self.parse_compile_section_line(line, sink),
        }
    }

    fn parse_compile_section_line(
        &mut self,
        line: &str,
        sink: &mut dyn RecordSink,
    ) -> Option<String> {
        if let Some(caps) = INCLUDE_NOTE_RE.captures(line) {
            let header = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let Some(ctx) = &self.current else {
                return Some(format!(
                    "project '{}': include note for '{}' without a preceding compile line",
                    self.project_name, header
                ));
            };
            let path = absolutize(&normalize_separators(header), &self.project_dir);
            sink.insert(record_for(&path, ctx));
            return None;
        }

        if !invocation::is_compiler_invocation(line, &self.compiler_exe) {
            return None;
        }

        let ctx = Arc::new(RecordContext {
            project_name: self.project_name.clone(),
            project_file: self.project_file.clone(),
            defines: invocation::parse_defines(line),
            user_includes: invocation::parse_includes(line, &self.project_dir),
            system_includes: self.system_includes.clone(),
        });
        self.current = Some(Arc::clone(&ctx));

        for file in invocation::parse_compiled_files(line, &self.project_dir) {
            sink.insert(record_for(&file, &ctx));
            if let Some(graph) = &self.graph {
                let config = SearchConfig::for_root(
                    &file,
                    ctx.user_includes.clone(),
                    ctx.system_includes.clone(),
                );
                graph.process_includes(&file, config, Arc::clone(&ctx));
            }
        }
        None
    }
}

fn record_for(file_path: &str, ctx: &RecordContext) -> CompileRecord {
    CompileRecord {
        file_path: file_path.to_string(),
        project_name: ctx.project_name.clone(),
        project_file: ctx.project_file.clone(),
        defines: ctx.defines.clone(),
        user_includes: ctx.user_includes.clone(),
        system_includes: ctx.system_includes.clone(),
    }
}
