mod common;

use common::TestFixture;
use predicates::prelude::*;

#[test]
fn test_parse_log_into_index() {
    let fixture = TestFixture::new();
    let log = fixture.sample_log();

    fixture
        .command()
        .arg("parse")
        .arg(&log)
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 files indexed"));

    assert!(fixture.path().join("index.db").exists());
}

#[test]
fn test_parse_reads_stdin_when_no_log_given() {
    let fixture = TestFixture::new();
    let log = fixture.sample_log();
    let content = std::fs::read_to_string(&log).unwrap();

    fixture
        .command()
        .arg("parse")
        .write_stdin(content)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 files indexed"));
}

#[test]
fn test_parse_emits_compile_commands() {
    let fixture = TestFixture::new();
    let log = fixture.sample_log();

    fixture
        .command()
        .arg("parse")
        .arg(&log)
        .arg("--compile-commands")
        .arg("compile_commands.json")
        .assert()
        .success();

    let json = std::fs::read_to_string(fixture.path().join("compile_commands.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    let commands: Vec<&str> = entries
        .iter()
        .map(|e| e["command"].as_str().unwrap())
        .collect();
    assert!(commands.iter().all(|c| c.starts_with("clang++ ")));
    assert!(commands.iter().any(|c| c.contains("-DFOO=1")));
}

#[test]
fn test_multibyte_path_survives_read_chunking() {
    let fixture = TestFixture::new();
    let dir = fixture.path().to_string_lossy().into_owned();
    let head = format!(
        "Project \"{dir}/all.sln\" on node 1 (default targets).\n\
         rem vim-vs-begin: ProjectName=\"demo\", ProjectPath=\"{dir}/demo.vcxproj\", IncludePath=\n\
         ClCompile:\n"
    );
    let invocation = format!("  {dir}/tools/cl.exe /c /D FOO=1 ");
    // Pad so the two bytes of 'ü' straddle the reader's 8192-byte chunks
    let pad = 8191 - head.len() - invocation.len() - 5;
    let filler = format!("rem {}\n", "x".repeat(pad));
    let log_text = format!(
        "{head}{filler}{invocation}übersicht.cpp\n\
         rem vim-vs-end: ProjectName=\"demo\"\n"
    );
    assert_eq!(log_text.as_bytes()[8191], "ü".as_bytes()[0]);
    let log = fixture.write_file("build.log", &log_text);

    fixture
        .command()
        .arg("parse")
        .arg(&log)
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 files indexed"));

    fixture
        .command()
        .arg("query")
        .arg("übersicht.cpp")
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("übersicht.cpp  [demo]"));
}

#[test]
fn test_parse_resolves_header_closure() {
    let fixture = TestFixture::new();
    let dir = fixture.path().to_string_lossy().into_owned();
    fixture.write_file("main.cpp", "#include \"lib/a.h\"\nint main() { return 0; }\n");
    fixture.write_file("lib/a.h", "#pragma once\n");
    let log = fixture.write_file(
        "build.log",
        &format!(
            "Project \"{dir}/all.sln\" on node 1 (default targets).\n\
             rem vim-vs-begin: ProjectName=\"demo\", ProjectPath=\"{dir}/demo.vcxproj\", IncludePath=\n\
             ClCompile:\n\
             \x20 {dir}/tools/cl.exe /c main.cpp\n\
             rem vim-vs-end: ProjectName=\"demo\"\n"
        ),
    );

    // The source record plus the header discovered by the resolver
    fixture
        .command()
        .arg("parse")
        .arg(&log)
        .arg("--resolve-headers")
        .arg("--parallel")
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 files indexed"));
}

#[test]
fn test_diagnostics_reported_on_stderr() {
    let fixture = TestFixture::new();
    let dir = fixture.path().to_string_lossy().into_owned();
    let log = fixture.write_file(
        "build.log",
        &format!(
            "Project \"{dir}/all.sln\" on node 1 (default targets).\n\
             {dir}/main.cpp(42): error C2065: 'x': undeclared identifier\n\
             {dir}/main.cpp(42): error C2065: 'x': undeclared identifier\n"
        ),
    );

    fixture
        .command()
        .arg("parse")
        .arg(&log)
        .assert()
        .success()
        .stderr(predicate::str::contains("C2065"))
        .stderr(predicate::str::contains("1 error(s), 0 warning(s)"));
}

#[test]
fn test_missing_log_file_fails() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .arg("parse")
        .arg("no-such.log")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open log"));
}
