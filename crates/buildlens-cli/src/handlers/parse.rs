use crate::config::Config;
use crate::output;
use anyhow::{Context, Result};
use buildlens_graph::{DependencyGraph, RunMode};
use buildlens_index::Database;
use buildlens_parser::LogParser;
use buildlens_types::{CompileRecord, MemoryStore, RecordSink};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

pub struct IngestOptions {
    pub resolve_headers: bool,
    pub parallel: bool,
    pub db: Option<PathBuf>,
    pub compile_commands: Option<PathBuf>,
    pub verbose: bool,
    /// Echo the log to stdout while parsing (used by `build`)
    pub echo: bool,
}

pub fn handle(log: Option<PathBuf>, opts: IngestOptions, config: &Config) -> Result<()> {
    match log {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open log: {}", path.display()))?;
            ingest(file, opts, config)
        }
        None => ingest(io::stdin().lock(), opts, config),
    }
}

/// Records go either to the SQLite index or to memory. Memory is the
/// fallback when no database is configured and the caller only wants a
/// compile_commands.json or the diagnostic report.
enum Sink {
    Memory(MemoryStore),
    Database(Database),
}

impl RecordSink for Sink {
    fn contains(&self, file_path: &str) -> bool {
        match self {
            Sink::Memory(store) => store.contains(file_path),
            Sink::Database(db) => db.contains(file_path),
        }
    }

    fn insert(&mut self, record: CompileRecord) {
        match self {
            Sink::Memory(store) => store.insert(record),
            Sink::Database(db) => db.insert(record),
        }
    }
}

pub(crate) fn ingest<R: Read>(reader: R, opts: IngestOptions, config: &Config) -> Result<()> {
    let graph = opts.resolve_headers.then(|| {
        DependencyGraph::new(if opts.parallel {
            RunMode::Parallel
        } else {
            RunMode::Deferred
        })
    });

    let mut parser = LogParser::new(&config.compiler_exe);
    if let Some(graph) = &graph {
        parser = parser.with_graph(Arc::clone(graph));
    }

    let mut sink = match opts.db.as_ref().or(config.db_path.as_ref()) {
        Some(path) => Sink::Database(Database::open(path)?),
        None => Sink::Memory(MemoryStore::new()),
    };

    let mut reader = reader;
    let mut buf = [0u8; 8192];
    let mut carry: Vec<u8> = Vec::new();
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        carry.extend_from_slice(&buf[..n]);
        // A read boundary can cut a multibyte sequence; hold the truncated
        // tail for the next read. Genuinely invalid bytes are left to the
        // lossy conversion.
        let split = match std::str::from_utf8(&carry) {
            Ok(_) => carry.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => carry.len(),
        };
        if split == 0 {
            continue;
        }
        let chunk = String::from_utf8_lossy(&carry[..split]).into_owned();
        carry.drain(..split);
        if opts.echo {
            print!("{}", chunk);
            io::stdout().flush()?;
        }
        parser.feed(&chunk, &mut sink);
    }
    if !carry.is_empty() {
        // Input ended mid-sequence; nothing more is coming
        parser.feed(&String::from_utf8_lossy(&carry), &mut sink);
    }
    parser.finish(&mut sink);

    if let Some(graph) = &graph {
        graph.finish_work();
        graph.flush(&mut sink);

        let issues = graph.issues();
        if opts.verbose {
            for issue in &issues {
                eprintln!("{}", issue);
            }
        } else if !issues.is_empty() {
            eprintln!(
                "{} includes could not be resolved (--verbose lists them)",
                issues.len()
            );
        }
    }

    for fault in parser.inconsistencies() {
        eprintln!("log inconsistency: {}", fault);
    }
    output::report::print_diagnostics(parser.diagnostics());

    match &mut sink {
        Sink::Database(db) => {
            if let Some(err) = db.take_write_error() {
                return Err(err).context("Failed writing records to the index");
            }
            println!("{} files indexed", db.count()?);
            if let Some(out) = &opts.compile_commands {
                let entries = db
                    .all_files()?
                    .into_iter()
                    .map(|e| (e.full_path.clone(), e.clang_arguments()));
                output::compile_commands::write(out, entries, &config.common_flags)?;
                println!("wrote {}", out.display());
            }
        }
        Sink::Memory(store) => {
            println!("{} files indexed", store.len());
            if let Some(out) = &opts.compile_commands {
                let entries = store
                    .records()
                    .iter()
                    .map(|r| (r.file_path.clone(), r.clang_arguments()));
                output::compile_commands::write(out, entries, &config.common_flags)?;
                println!("wrote {}", out.display());
            }
        }
    }

    Ok(())
}
