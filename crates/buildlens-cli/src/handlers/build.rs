use super::parse::{self, IngestOptions};
use crate::config::Config;
use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Launch the configured build command and parse its stdout as it streams.
/// The index is written even when the build fails; a partial build still
/// produces usable records.
pub fn handle(extra_args: &[String], opts: IngestOptions, config: &Config) -> Result<()> {
    let command_line = config
        .build_command
        .as_deref()
        .context("No build_command configured; set it in buildlens.toml")?;
    let mut parts = command_line.split_whitespace();
    let program = parts.next().context("build_command is empty")?;

    let mut child = Command::new(program)
        .args(parts)
        .args(extra_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to launch '{}'", program))?;
    let stdout = child
        .stdout
        .take()
        .context("Build process has no stdout handle")?;

    let parsed = parse::ingest(stdout, opts, config);
    let status = child.wait()?;
    parsed?;

    if !status.success() {
        anyhow::bail!("build command exited with {}", status);
    }
    Ok(())
}
