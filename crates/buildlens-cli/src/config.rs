use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings from `buildlens.toml`. Every field has a default so a missing
/// file or an empty table is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Executable name whose invocations are extracted from the log. A
    /// stand-in compiler wrapper can be named here instead of cl.exe.
    pub compiler_exe: String,

    /// Where the SQLite index lives. `--db` on the command line wins.
    pub db_path: Option<PathBuf>,

    /// Command line for `buildlens build`, e.g.
    /// `msbuild.exe all.sln /m /v:minimal`.
    pub build_command: Option<String>,

    /// Flags prepended to every entry of an emitted compile_commands.json.
    pub common_flags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compiler_exe: "cl.exe".to_string(),
            db_path: None,
            build_command: None,
            common_flags: vec![
                "-std=c++14".to_string(),
                "-fms-extensions".to_string(),
                "-fms-compatibility".to_string(),
                "-DCINTERFACE".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        Self::load_from(&resolve_config_path(explicit_path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }
}

/// Resolve the configuration file path based on priority:
/// 1. Explicit `--config` path (with tilde expansion)
/// 2. BUILDLENS_CONFIG environment variable (with tilde expansion)
/// 3. buildlens.toml in the current directory
pub fn resolve_config_path(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return expand_tilde(path);
    }

    if let Ok(env_path) = std::env::var("BUILDLENS_CONFIG") {
        return expand_tilde(&env_path);
    }

    PathBuf::from("buildlens.toml")
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.compiler_exe, "cl.exe");
        assert!(config.db_path.is_none());
        assert!(config.common_flags.contains(&"-std=c++14".to_string()));
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("nonexistent.toml"))?;
        assert_eq!(config.compiler_exe, "cl.exe");
        Ok(())
    }

    #[test]
    fn test_partial_config_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("buildlens.toml");
        std::fs::write(&path, "compiler_exe = \"shim-cl.exe\"\n")?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.compiler_exe, "shim-cl.exe");
        assert!(!config.common_flags.is_empty());
        Ok(())
    }

    #[test]
    fn test_full_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("buildlens.toml");
        std::fs::write(
            &path,
            r#"
compiler_exe = "cl.exe"
db_path = "out/index.db"
build_command = "msbuild.exe all.sln /m"
common_flags = ["-std=c++17"]
"#,
        )?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.db_path, Some(PathBuf::from("out/index.db")));
        assert_eq!(
            config.build_command.as_deref(),
            Some("msbuild.exe all.sln /m")
        );
        assert_eq!(config.common_flags, vec!["-std=c++17".to_string()]);
        Ok(())
    }
}
