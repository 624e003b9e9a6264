mod common;

use common::TestFixture;
use predicates::prelude::*;

fn index_sample(fixture: &TestFixture) {
    let log = fixture.sample_log();
    fixture
        .command()
        .arg("parse")
        .arg(&log)
        .arg("--db")
        .arg("index.db")
        .assert()
        .success();
}

#[test]
fn test_query_by_basename() {
    let fixture = TestFixture::new();
    index_sample(&fixture);

    fixture
        .command()
        .arg("query")
        .arg("util.cpp")
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("util.cpp  [demo]"))
        .stdout(predicate::str::contains("-DFOO=1"));
}

#[test]
fn test_query_is_case_insensitive() {
    let fixture = TestFixture::new();
    index_sample(&fixture);

    fixture
        .command()
        .arg("query")
        .arg("SHARED.H")
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("shared.h"));
}

#[test]
fn test_query_json_output() {
    let fixture = TestFixture::new();
    index_sample(&fixture);

    let output = fixture
        .command()
        .arg("query")
        .arg("main.cpp")
        .arg("--db")
        .arg("index.db")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let matches = parsed.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["project"], "demo");
    let args: Vec<&str> = matches[0]["arguments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    assert!(args.contains(&"-DFOO=1"));
}

#[test]
fn test_query_unknown_name() {
    let fixture = TestFixture::new();
    index_sample(&fixture);

    fixture
        .command()
        .arg("query")
        .arg("nope.h")
        .arg("--db")
        .arg("index.db")
        .assert()
        .success()
        .stdout(predicate::str::contains("no indexed file named 'nope.h'"));
}
