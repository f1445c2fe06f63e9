//! # doclayer CLI
//!
//! Command-line interface for the doclayer documentation assistant.
//!
//! The binary is a thin layer over `doclayer-core`: it parses flags, builds a
//! [`doclayer_core::DocLayerEngine`] and prints results. Run `doclayer --help`
//! for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
