//! Integration tests for `doclayer ask`.
//!
//! The model server is unreachable in these tests, so answers either come
//! from a pre-seeded cache or the command fails.

mod common;

use std::fs;

use doclayer_core::{cache_key, cache_params};
use predicates::prelude::*;

use common::Fixture;

fn seed_cache(fx: &Fixture, question: &str, top_k: usize, answer: &str) {
    let key = cache_key(question, Some(&cache_params([("top_k", top_k)])));
    let mut body = serde_json::Map::new();
    body.insert(key, answer.into());
    fs::write(&fx.cache, serde_json::to_string_pretty(&body).unwrap()).unwrap();
}

#[test]
fn test_ask_served_from_cache() {
    let fx = Fixture::new();
    seed_cache(&fx, "How is config parsed?", 2, "It is read with json.load.");

    fx.cmd()
        .arg("ask")
        .arg("How is config parsed?")
        .arg("--repo")
        .arg(fx.repo_arg())
        .arg("--top-k")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("ANSWER"))
        .stdout(predicate::str::contains("It is read with json.load."))
        .stdout(predicate::str::contains("[info] Answer served from cache"));
}

#[test]
fn test_ask_cache_is_keyed_by_top_k() {
    let fx = Fixture::new();
    seed_cache(&fx, "How is config parsed?", 2, "cached for two");

    // Same question, different top_k: a cache miss, and the model is unreachable.
    fx.cmd()
        .arg("ask")
        .arg("How is config parsed?")
        .arg("--repo")
        .arg(fx.repo_arg())
        .arg("--top-k")
        .arg("3")
        .assert()
        .failure()
        .stdout(predicate::str::contains("cached for two").not())
        .stderr(predicate::str::contains("[err]"));
}

#[test]
fn test_ask_json_output() {
    let fx = Fixture::new();
    seed_cache(&fx, "What does load_config return?", 4, "An empty dict.");

    let output = fx
        .cmd()
        .arg("ask")
        .arg("What does load_config return?")
        .arg("--repo")
        .arg(fx.repo_arg())
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["answer"], "An empty dict.");
    assert_eq!(outcome["fromCache"], true);
}

#[test]
fn test_ask_failure_is_not_cached() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("ask")
        .arg("Where is the area computed?")
        .arg("--repo")
        .arg(fx.repo_arg())
        .assert()
        .failure()
        .stderr(predicate::str::contains("[err]"))
        .stderr(predicate::str::contains("Hint: Make sure Ollama is running"));

    assert!(!fx.cache.exists());
}

#[test]
fn test_ask_with_corrupted_cache_fails() {
    let fx = Fixture::new();
    fs::write(&fx.cache, "{ not json").unwrap();

    fx.cmd()
        .arg("ask")
        .arg("How is config parsed?")
        .arg("--repo")
        .arg(fx.repo_arg())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is corrupted"))
        .stderr(predicate::str::contains("doclayer cache clear"));

    assert_eq!(fs::read_to_string(&fx.cache).unwrap(), "{ not json");
}
