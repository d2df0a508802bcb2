//! Output utilities for CLI commands
//!
//! Spinners with elapsed time display for the quiet stretches of a run.

pub mod spinner;

pub use spinner::SpinnerProgress;
