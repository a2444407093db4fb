use crate::logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{stdout, IsTerminal};
use std::time::Duration;

/// Cargo-style stage reporting for long-running stack operations
pub(crate) struct Progress {
    progress_bar: ProgressBar,
    resource_name: String,
}

pub(crate) enum ProgressStatus {
    Success,
    Warn,
    Error,
}

impl Progress {
    pub(crate) fn new(resource_name: &str) -> Self {
        let progress_bar = Logger::multi_progress().add(ProgressBar::new_spinner());

        progress_bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());

        Self {
            progress_bar,
            resource_name: resource_name.to_string(),
        }
    }

    /// Keep a live spinner on screen while waiting on CloudFormation
    pub(crate) fn wait(&self, message: &str) {
        self.progress_bar.set_message(message.to_string());
        self.progress_bar
            .enable_steady_tick(Duration::from_millis(120));
    }

    pub(crate) fn log_stage(&self, stage: &str) {
        let msg = format!(
            "{} {}",
            console::style(self.with_padding(stage)).green().bold(),
            self.resource_name,
        );

        // Terminal or CI/CD?
        if stdout().is_terminal() {
            self.progress_bar.println(msg);
        } else {
            self.progress_bar.suspend(|| {
                println!("{msg}");
            });
        }
    }

    pub(crate) fn finish(&self, stage: &str, status: ProgressStatus, message: Option<&str>) {
        let stage = console::style(self.with_padding(stage)).bold();
        let stage = match status {
            ProgressStatus::Success => stage.green(),
            ProgressStatus::Warn => stage.yellow(),
            ProgressStatus::Error => stage.red(),
        };
        let message = message.map(|m| format!(": {m}")).unwrap_or_default();

        // The spinner glyph has no place in the final line
        self.progress_bar
            .set_style(ProgressStyle::with_template("{msg}").unwrap());
        self.progress_bar
            .finish_with_message(format!("{} {}{}", stage, self.resource_name, message));
    }

    pub(crate) fn error(&self, stage: &str) {
        self.finish(stage, ProgressStatus::Error, None);
    }

    // Required padding to make the message aligned in the cargo-like style
    fn with_padding(&self, message: &str) -> String {
        let len = message.len();
        let padding = " ".repeat(12 - len);
        format!("{}{}", padding, message)
    }
}
