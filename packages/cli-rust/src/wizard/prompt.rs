//! Prompt primitives
//!
//! Reading answers goes through [`Prompter`] so the collection loops can be
//! driven by scripted answers in tests.

use anyhow::{Result, anyhow};
use console::{Term, style};
use dialoguer::{Input, Password};
use dockship_core::RunLog;

/// Source of operator answers
pub trait Prompter {
    /// Read one line; empty input is returned as an empty string
    fn input(&self, label: &str, default: Option<&str>) -> Result<String>;

    /// Read one line without echoing it
    fn secret(&self, label: &str) -> Result<String>;
}

/// Handle Ctrl+C by restoring cursor and returning error
fn handle_interrupt() -> anyhow::Error {
    let _ = Term::stdout().show_cursor();
    anyhow!("Interrupted while waiting for input")
}

/// [`Prompter`] reading from the terminal with dialoguer
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn input(&self, label: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(default) => format!("{label} {}", style(format!("[{default}]")).dim()),
            None => label.to_string(),
        };

        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|_| handle_interrupt())
    }

    fn secret(&self, label: &str) -> Result<String> {
        Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map_err(|_| handle_interrupt())
    }
}

/// Prompt until the answer passes `validate`
///
/// Blank input takes `default` when there is one and re-prompts otherwise.
/// Any other answer reaches `validate` exactly as typed, surrounding
/// whitespace included. Each accepted or rejected answer is written to the
/// run log.
pub fn prompt_validated<T>(
    prompter: &dyn Prompter,
    log: &RunLog,
    label: &str,
    default: Option<&str>,
    validate: impl Fn(&str) -> Result<T, String>,
) -> Result<T> {
    loop {
        let answer = prompter.input(label, default)?;

        let value = match (answer.trim().is_empty(), default) {
            (false, _) => answer.as_str(),
            (true, Some(default)) => default,
            (true, None) => {
                log.warning(format!("{label} is required"));
                continue;
            }
        };

        log.info(format!("{label}: {value}"));
        match validate(value) {
            Ok(parsed) => return Ok(parsed),
            Err(message) => log.warning(message),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedPrompter;
    use super::*;
    use dockship_core::validate::parse_port;

    fn quiet_log(dir: &std::path::Path) -> RunLog {
        RunLog::open(&dir.join("test.log"), false).unwrap()
    }

    #[test]
    fn test_empty_input_takes_default() {
        let dir = tempfile::tempdir().unwrap();
        let log = quiet_log(dir.path());
        let prompter = ScriptedPrompter::new(&[""]);

        let port = prompt_validated(&prompter, &log, "Application port", Some("8080"), parse_port)
            .unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let dir = tempfile::tempdir().unwrap();
        let log = quiet_log(dir.path());
        let prompter = ScriptedPrompter::new(&["0", "abc", "65536", "9090"]);

        let port = prompt_validated(&prompter, &log, "Application port", Some("8080"), parse_port)
            .unwrap();
        assert_eq!(port, 9090);
        assert_eq!(prompter.asked.borrow().len(), 4);

        let contents = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
        assert_eq!(contents.matches("[WARNING]").count(), 3);
    }

    #[test]
    fn test_answer_is_validated_untrimmed() {
        let dir = tempfile::tempdir().unwrap();
        let log = quiet_log(dir.path());
        let prompter = ScriptedPrompter::new(&[" 80", "80 ", "80"]);

        let port = prompt_validated(&prompter, &log, "Application port", Some("8080"), parse_port)
            .unwrap();
        assert_eq!(port, 80);
        assert_eq!(prompter.asked.borrow().len(), 3);
    }

    #[test]
    fn test_required_field_reprompts_on_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = quiet_log(dir.path());
        let prompter = ScriptedPrompter::new(&["", "  ", "", "10.0.0.5"]);

        let host = prompt_validated(&prompter, &log, "Server address", None, |v| {
            Ok::<_, String>(v.to_string())
        })
        .unwrap();
        assert_eq!(host, "10.0.0.5");
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_prompter_error_stops_loop() {
        let dir = tempfile::tempdir().unwrap();
        let log = quiet_log(dir.path());
        let prompter = ScriptedPrompter::new(&["bad"]);

        let result = prompt_validated(&prompter, &log, "Application port", None, parse_port);
        assert!(result.is_err());
    }
}
