//! Shared test utilities for doclayer-cli integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Nothing listens on the discard port, so generation fails fast.
pub const UNREACHABLE_OLLAMA: &str = "http://127.0.0.1:9";

/// Get a Command for the doclayer binary.
///
/// # Panics
///
/// Panics if the doclayer binary cannot be found.
#[allow(deprecated)]
pub fn doclayer_cmd() -> Command {
    Command::cargo_bin("doclayer").expect("doclayer binary should exist")
}

pub const CONFIG_PY: &str = r#"import json


def parse_config(path):
    with open(path) as fh:
        return json.load(fh)


def load_config():
    return {}
"#;

pub const SHAPES_PY: &str = r#"class Shape:
    def area(self):
        return 0


class Square(Shape):
    def __init__(self, side):
        self.side = side

    def area(self):
        return self.side * self.side


def render_html(page):
    return "<html>" + page + "</html>"
"#;

/// A throwaway Python repository plus isolated config and cache paths.
pub struct Fixture {
    pub temp: TempDir,
    pub repo: PathBuf,
    pub cache: PathBuf,
    pub config: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join("pkg")).expect("create repo");
        fs::write(repo.join("pkg").join("config.py"), CONFIG_PY).expect("write config.py");
        fs::write(repo.join("shapes.py"), SHAPES_PY).expect("write shapes.py");

        let cache = temp.path().join("cache.json");
        // Never created: a missing config file means defaults.
        let config = temp.path().join("config.yaml");

        Self {
            temp,
            repo,
            cache,
            config,
        }
    }

    /// `doclayer` with this fixture's config and cache, no colors, and an
    /// unreachable model server.
    pub fn cmd(&self) -> Command {
        let mut cmd = doclayer_cmd();
        cmd.current_dir(self.temp.path())
            .env_remove("DOCLAYER_MODEL")
            .env_remove("DOCLAYER_VERBOSE")
            .env_remove("DOCLAYER_QUIET")
            .arg("--color")
            .arg("never")
            .arg("--config")
            .arg(&self.config)
            .arg("--cache")
            .arg(&self.cache)
            .arg("--ollama-url")
            .arg(UNREACHABLE_OLLAMA);
        cmd
    }

    pub fn repo_arg(&self) -> &Path {
        &self.repo
    }
}
