//! Integration tests for `doclayer uml`.

mod common;

use std::fs;

use predicates::prelude::*;

use common::Fixture;

#[test]
fn test_uml_dot_to_stdout() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("uml")
        .arg(fx.repo_arg())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph \"UML\" {"))
        .stdout(predicate::str::contains("subgraph \"cluster_0\""))
        .stdout(predicate::str::contains("shapes.py"))
        .stdout(predicate::str::contains(
            "\"Shape\" -> \"Square\" [label=\"inherits\", arrowhead=onormal];",
        ));
}

#[test]
fn test_uml_mermaid_with_functions() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("uml")
        .arg(fx.repo_arg())
        .arg("--format")
        .arg("mermaid")
        .arg("--functions")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("```mermaid\nclassDiagram"))
        .stdout(predicate::str::contains("Shape <|-- Square : inherits"))
        .stdout(predicate::str::contains("+render_html()"));
}

#[test]
fn test_uml_out_file() {
    let fx = Fixture::new();
    let out = fx.temp.path().join("classes.dot");

    fx.cmd()
        .arg("uml")
        .arg(fx.repo_arg())
        .arg("--title")
        .arg("Shapes")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("[ok] Wrote dot diagram"));

    let dot = fs::read_to_string(&out).unwrap();
    assert!(dot.starts_with("digraph \"Shapes\" {"));
    assert!(dot.ends_with('}'));
}

#[test]
fn test_uml_rejects_unknown_format() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("uml")
        .arg(fx.repo_arg())
        .arg("--format")
        .arg("svg")
        .assert()
        .failure();
}
