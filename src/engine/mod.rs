//! Console front end for reconciliation runs
//!
//! The engine renders what the declarative crate computes:
//! 1. Display - Plain-text lines for snapshots, plan stages and definitions
//! 2. Progress - Spinner, stage sections and outcomes as a run advances

pub mod display;
pub mod progress;

pub use display::definition_lines;
pub use progress::{ConsoleProgress, print_summary, spinner};
