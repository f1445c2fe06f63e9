//! Progress indicators for long-running CLI operations.
//!
//! Spinners cover model calls (`ask`, `summarize-last-commit`) and a bar
//! tracks `generate` file by file. Everything is hidden when stdout is not a
//! terminal, with `--quiet`, or with `--json`.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress feedback mode based on output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive TTY: show animated spinners and progress bars
    Interactive,
    /// Non-TTY or quiet: suppress progress, show only final results
    Quiet,
    /// Machine-readable: no progress and no summary lines (for --json)
    Silent,
}

impl ProgressMode {
    pub fn detect(quiet: bool, json: bool) -> Self {
        if json {
            Self::Silent
        } else if quiet || !std::io::stdout().is_terminal() {
            Self::Quiet
        } else {
            Self::Interactive
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Progress bar characters.
const BAR_CHARS: &str = "█░";

/// A spinner or progress bar that disappears outside interactive mode.
pub struct Progress {
    bar: ProgressBar,
    mode: ProgressMode,
}

impl Progress {
    /// Spinner for work of unknown length, such as a model call.
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} ({elapsed})")
            {
                pb.set_style(style.tick_chars(SPINNER_CHARS));
            }
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar, mode }
    }

    /// Bar over `total` items. The total may be fixed later with [`Self::set_length`].
    pub fn bar(total: u64, message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{bar:20.cyan/dim}] {percent:>3}% ({pos}/{len}) {msg} ({elapsed})")
            {
                pb.set_style(style.progress_chars(BAR_CHARS));
            }
            pb.set_message(message.to_string());
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar, mode }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn set_length(&self, total: u64) {
        self.bar.set_length(total);
    }

    pub fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    /// Print a line above the bar without breaking its rendering.
    pub fn println(&self, line: &str) {
        if self.mode.is_interactive() {
            self.bar.println(line);
        } else if self.mode == ProgressMode::Quiet {
            println!("{}", line);
        }
    }

    /// Finish and clear the progress line.
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_silent() {
        assert_eq!(ProgressMode::detect(false, true), ProgressMode::Silent);
        assert_eq!(ProgressMode::detect(true, true), ProgressMode::Silent);
    }

    #[test]
    fn test_quiet_is_not_interactive() {
        assert_eq!(ProgressMode::detect(true, false), ProgressMode::Quiet);
        assert!(!ProgressMode::Quiet.is_interactive());
        assert!(ProgressMode::Interactive.is_interactive());
    }

    #[test]
    fn test_hidden_bar_still_counts() {
        let progress = Progress::bar(0, "Documenting", ProgressMode::Quiet);
        progress.set_length(3);
        progress.inc(2);
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.length(), Some(3));
        progress.finish_clear();
    }
}
