//! Collaborators shared by every stage of a run

use std::time::Duration;

use crate::config::Settings;
use crate::exec::CommandRunner;
use crate::runlog::RunLog;

/// Feedback for quiet stretches of a run, such as waits and checks that
/// print nothing
pub trait Progress {
    fn begin(&self, message: &str);
    fn end(&self, succeeded: bool);
}

/// Borrowed handles passed to each stage instead of global state
pub struct DeployContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub log: &'a RunLog,
    pub settings: &'a Settings,
    progress: Option<&'a dyn Progress>,
}

impl<'a> DeployContext<'a> {
    pub fn new(runner: &'a dyn CommandRunner, log: &'a RunLog, settings: &'a Settings) -> Self {
        Self {
            runner,
            log,
            settings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settings.settle_delay_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.settings.probe_interval_secs)
    }

    /// Run `work` with progress feedback around it
    pub fn during<T, E>(&self, message: &str, work: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        if let Some(progress) = self.progress {
            progress.begin(message);
        }
        let result = work();
        if let Some(progress) = self.progress {
            progress.end(result.is_ok());
        }
        result
    }

    /// Sleep for `delay`, shown as progress
    pub fn wait(&self, message: &str, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let _ = self.during(message, || {
            std::thread::sleep(delay);
            Ok::<(), std::convert::Infallible>(())
        });
    }
}
