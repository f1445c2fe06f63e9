//! Integration tests for `doclayer search`.

mod common;

use predicates::prelude::*;

use common::Fixture;

#[test]
fn test_search_ranks_exact_match_first() {
    let fx = Fixture::new();

    let output = fx
        .cmd()
        .arg("search")
        .arg("parse config")
        .arg("--repo")
        .arg(fx.repo_arg())
        .assert()
        .success()
        .stdout(predicate::str::contains("matching function(s)"))
        .stdout(predicate::str::contains("pkg/config.py:4"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let first = stdout.find("parse_config").expect("parse_config listed");
    let second = stdout.find("load_config").expect("load_config listed");
    assert!(first < second);
}

#[test]
fn test_search_json_output() {
    let fx = Fixture::new();

    let output = fx
        .cmd()
        .arg("search")
        .arg("parse config")
        .arg("--repo")
        .arg(fx.repo_arg())
        .arg("--top-k")
        .arg("1")
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let hits: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["functionName"], "parse_config");
    assert_eq!(hits[0]["score"], 1.0);
    assert_eq!(hits[0]["lineNumber"], 4);
}

#[test]
fn test_search_without_searchable_words() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("search")
        .arg("?!")
        .arg("--repo")
        .arg(fx.repo_arg())
        .assert()
        .success()
        .stdout(predicate::str::contains("[info] No matching functions found."));
}

#[test]
fn test_search_missing_repo_fails() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("search")
        .arg("parse config")
        .arg("--repo")
        .arg(fx.temp.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("[err]"));
}
