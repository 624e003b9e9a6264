use anyhow::{Context, Result};
use buildlens_core::path::split_folder_file;
use serde::Serialize;
use std::path::Path;

/// One compile_commands.json entry, as consumed by clangd and libclang.
#[derive(Serialize)]
struct Entry {
    directory: String,
    command: String,
    file: String,
}

/// Write a compile_commands.json for `(file, arguments)` pairs. The command
/// is spelled as a clang++ invocation: the records came from cl.exe, but the
/// consumers of this file are clang-based tools.
pub fn write(
    path: &Path,
    items: impl Iterator<Item = (String, Vec<String>)>,
    common_flags: &[String],
) -> Result<()> {
    let entries: Vec<Entry> = items
        .map(|(file, arguments)| {
            let (directory, _) = split_folder_file(&file);
            let command = std::iter::once("clang++".to_string())
                .chain(common_flags.iter().cloned())
                .chain(arguments)
                .chain(std::iter::once(file.clone()))
                .map(|arg| quote(&arg))
                .collect::<Vec<_>>()
                .join(" ");
            Entry {
                directory: directory.trim_end_matches('/').to_string(),
                command,
                file,
            }
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn quote(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}
