use crate::config::Config;
use anyhow::{Context, Result};
use buildlens_index::Database;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct Match<'a> {
    file: &'a str,
    project: &'a str,
    arguments: Vec<String>,
}

pub fn handle(name: &str, db: Option<PathBuf>, json: bool, config: &Config) -> Result<()> {
    let path = db
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(|| PathBuf::from("buildlens.db"));
    let db = Database::open(&path)?;
    let entries = db
        .get_with_basename(name)
        .with_context(|| format!("Lookup failed for '{}'", name))?;

    if json {
        let matches: Vec<Match<'_>> = entries
            .iter()
            .map(|e| Match {
                file: &e.full_path,
                project: &e.project_name,
                arguments: e.clang_arguments(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("no indexed file named '{}'", name);
        return Ok(());
    }
    for entry in &entries {
        println!("{}  [{}]", entry.full_path, entry.project_name);
        println!("  {}", entry.clang_arguments().join(" "));
    }
    Ok(())
}
