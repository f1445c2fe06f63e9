//! Git change detection, via the `git` binary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::constants::PYTHON_EXTENSION;
use crate::errors::{DocError, DocResult};

/// Python files changed between `base` and `target`, as paths under `repo`.
///
/// Deleted files are included; callers decide whether to skip them. The list
/// is deduplicated and sorted.
pub fn changed_files(repo: &Path, base: &str, target: &str) -> DocResult<Vec<PathBuf>> {
    let output = run_git(repo, &["diff", "--name-only", base, target])?;
    let suffix = format!(".{PYTHON_EXTENSION}");

    let files: BTreeSet<PathBuf> = output
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(&suffix))
        .map(|line| repo.join(line))
        .collect();

    tracing::debug!(base, target, count = files.len(), "Changed Python files");
    Ok(files.into_iter().collect())
}

/// Unified diff between `base` and `target`.
pub fn diff_text(repo: &Path, base: &str, target: &str) -> DocResult<String> {
    run_git(repo, &["diff", base, target])
}

fn run_git(repo: &Path, args: &[&str]) -> DocResult<String> {
    let git_error = |message: String| DocError::Git {
        command: args.join(" "),
        repo: repo.to_path_buf(),
        message,
    };

    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| git_error(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(git_error(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
