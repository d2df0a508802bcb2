//! Run log
//!
//! Every user-facing line of a run is timestamped, level-tagged, printed to
//! stdout with color and appended to `deploy_<YYYYMMDDHHMMSS>.log`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use console::Style;

/// Severity of a run log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    fn style(self) -> Style {
        match self {
            Level::Info => Style::new().cyan(),
            Level::Success => Style::new().green().bold(),
            Level::Warning => Style::new().yellow(),
            Level::Error => Style::new().red().bold(),
        }
    }
}

/// Name of the log file for a run started at `started`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("deploy_{}.log", started.format("%Y%m%d%H%M%S"))
}

/// Plain (uncolored) form of a log line
pub fn format_line(at: DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        level.tag(),
        message
    )
}

/// Append-only log sink shared by every stage of a run
pub struct RunLog {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    echo: bool,
}

impl RunLog {
    /// Create `deploy_<timestamp>.log` in `dir`, echoing to stdout
    pub fn create_in(dir: &Path) -> std::io::Result<Self> {
        let path = dir.join(log_file_name(Local::now()));
        Self::open(&path, true)
    }

    /// Append to an explicit path
    pub fn open(path: &Path, echo: bool) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Mutex::new(file)),
            path: Some(path.to_path_buf()),
            echo,
        })
    }

    /// Console-only log, used when the log file cannot be created
    pub fn console() -> Self {
        Self {
            file: None,
            path: None,
            echo: true,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, level: Level, message: &str) {
        let line = format_line(Local::now(), level, message);

        if self.echo {
            println!("{}", level.style().apply_to(&line));
        }

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                if let Err(e) = writeln!(file, "{line}") {
                    tracing::warn!("Failed to write run log: {}", e);
                }
            }
        }

        tracing::trace!(level = level.tag(), "{}", message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::Info, message.as_ref());
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.record(Level::Success, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.record(Level::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::Error, message.as_ref());
    }
}
