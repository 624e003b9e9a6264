//! Common test utilities shared across integration tests.
//!
//! Note: Clippy cannot track usage across integration test files,
//! hence the `allow(dead_code)` annotation. This is a standard pattern
//! for Rust integration test fixtures.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestFixture {
    temp_dir: TempDir,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    pub fn command(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("buildlens");
        cmd.current_dir(self.path());
        cmd
    }

    /// A minimal single-process build log: one project, one compiler
    /// invocation with two translation units, one /showIncludes note.
    pub fn sample_log(&self) -> PathBuf {
        let dir = self.path().to_string_lossy().into_owned();
        let log = format!(
            "Microsoft (R) Build Engine version 15.9\n\
             Build started.\n\
             Project \"{dir}/all.sln\" on node 1 (default targets).\n\
             rem vim-vs-begin: ProjectName=\"demo\", ProjectPath=\"{dir}/demo.vcxproj\", IncludePath={dir}/sys;\n\
             ClCompile:\n\
             \x20 {dir}/tools/cl.exe /c /Zi /D FOO=1 /I{dir}/inc main.cpp util.cpp\n\
             \x20 Note: including file:   {dir}/inc/shared.h\n\
             rem vim-vs-end: ProjectName=\"demo\"\n\
             Build succeeded.\n"
        );
        self.write_file("build.log", &log)
    }
}
