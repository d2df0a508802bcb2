//! Command spinner with elapsed time display
//!
//! Provides visual feedback during quiet stretches of a run, such as the
//! SSH check and the settle wait, with an animated spinner and elapsed time.

use std::cell::RefCell;
use std::time::Duration;

use dockship_core::Progress;
use indicatif::{ProgressBar, ProgressStyle};

/// A spinner for command operations with elapsed time display
///
/// Becomes a no-op when `quiet` is requested, e.g. when stdout is not a
/// terminal.
pub struct CommandSpinner {
    bar: Option<ProgressBar>,
}

impl CommandSpinner {
    /// Create a new spinner with the given message
    ///
    /// Shows: `spinner message (HH:MM:SS)`, ticking every 100ms.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed_precise:.dim})")
        {
            bar.set_style(style.tick_chars(
                "\u{28CB}\u{2819}\u{2839}\u{2838}\u{283C}\u{2834}\u{2826}\u{2827}\u{2807}\u{280F}",
            ));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn new_maybe(message: &str, quiet: bool) -> Self {
        if quiet {
            Self { bar: None }
        } else {
            Self::new(message)
        }
    }

    /// Finish the spinner with a success message (green checkmark)
    pub fn success(self, message: &str) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(format!(
                "{} {}",
                console::style("\u{2713}").green(),
                message
            ));
        }
    }

    /// Finish the spinner with a failure message (red X)
    pub fn fail(self, message: &str) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(format!("{} {}", console::style("\u{2717}").red(), message));
        }
    }
}

/// [`Progress`] shown as one spinner per quiet stretch
pub struct SpinnerProgress {
    quiet: bool,
    current: RefCell<Option<(CommandSpinner, String)>>,
}

impl SpinnerProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            current: RefCell::new(None),
        }
    }
}

impl Progress for SpinnerProgress {
    fn begin(&self, message: &str) {
        let spinner = CommandSpinner::new_maybe(message, self.quiet);
        if let Some((previous, label)) = self.current.replace(Some((spinner, message.to_string())))
        {
            previous.success(&label);
        }
    }

    fn end(&self, succeeded: bool) {
        if let Some((spinner, label)) = self.current.take() {
            if succeeded {
                spinner.success(&label);
            } else {
                spinner.fail(&label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_new_does_not_panic() {
        let spinner = CommandSpinner::new("test");
        spinner.success("done");
    }

    #[test]
    fn spinner_quiet_mode_is_noop() {
        let spinner = CommandSpinner::new_maybe("test", true);
        assert!(spinner.bar.is_none());
        spinner.fail("failed");
    }

    #[test]
    fn progress_tracks_current_spinner() {
        let progress = SpinnerProgress::new(true);
        progress.begin("Connecting");
        assert!(progress.current.borrow().is_some());
        progress.end(true);
        assert!(progress.current.borrow().is_none());
        // Ending twice is harmless
        progress.end(false);
    }
}
