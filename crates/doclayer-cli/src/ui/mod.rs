//! # CLI UI Module
//!
//! Styling and formatting for doclayer terminal output.
//!
//! Every command prints through [`Style`] so prefixes and colors stay the same
//! across `ask`, `search`, `generate` and friends. Colors are dropped when
//! `NO_COLOR` is set or stdout is not a terminal, and `--json` output bypasses
//! this module entirely.
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal width
//! - `style`: Message types, prefixes, and styling functions
//! - `format`: Truncation and size formatting
//! - `table`: Search hit and generation tables (comfy-table)
//! - `progress`: Spinners and progress bars (indicatif)

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use progress::{Progress, ProgressMode};
pub use style::{MessageType, Style};
