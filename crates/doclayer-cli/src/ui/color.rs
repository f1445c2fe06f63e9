//! Color mode detection for CLI output.
//!
//! Respects the `NO_COLOR` environment variable (https://no-color.org/) and
//! TTY detection.

use std::io::IsTerminal;
use std::str::FromStr;

/// Color output mode, selected with `--color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    Always,
    Never,
    /// Colors only on a terminal without `NO_COLOR`.
    #[default]
    Auto,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "invalid color mode '{}' (expected always, never or auto)",
                other
            )),
        }
    }
}

impl ColorMode {
    /// Check if colors should be used.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
        }
    }
}

/// Current terminal width, or 100 when it cannot be determined.
pub fn terminal_width() -> u16 {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0)
        .unwrap_or(100)
}
