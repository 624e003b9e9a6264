use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(about = "Reconstruct compiler invocations and header closures from Visual Studio build logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: BUILDLENS_CONFIG, then ./buildlens.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse an MSBuild log into a compile record index
    Parse {
        /// Log file to parse; reads stdin when omitted
        log: Option<PathBuf>,

        /// Resolve the include closure of every compiled file
        #[arg(long)]
        resolve_headers: bool,

        /// Resolve headers on a thread pool instead of inline
        #[arg(long, requires = "resolve_headers")]
        parallel: bool,

        /// SQLite index to write (overrides the configured path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Write a compile_commands.json to this path
        #[arg(long, value_name = "PATH")]
        compile_commands: Option<PathBuf>,

        /// Report every unresolved include instead of a summary count
        #[arg(long)]
        verbose: bool,
    },

    /// Run the configured build command and parse its output as it streams
    Build {
        /// Extra arguments appended to the configured build command
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,

        /// Resolve the include closure of every compiled file
        #[arg(long)]
        resolve_headers: bool,

        /// Resolve headers on a thread pool instead of inline
        #[arg(long, requires = "resolve_headers")]
        parallel: bool,

        /// SQLite index to write (overrides the configured path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Write a compile_commands.json to this path
        #[arg(long, value_name = "PATH")]
        compile_commands: Option<PathBuf>,

        /// Report every unresolved include instead of a summary count
        #[arg(long)]
        verbose: bool,
    },

    /// Look up indexed files by basename
    Query {
        /// File name to look up, e.g. `util.h`
        name: String,

        /// SQLite index to read (overrides the configured path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Emit matches as JSON
        #[arg(long)]
        json: bool,
    },
}
