use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a question is in flight
pub struct LoadingIndicator {
    spinner: Option<ProgressBar>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    pub fn start(&mut self, message: &str) {
        self.stop();

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));

        self.spinner = Some(spinner);
    }

    pub fn stop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub fn is_running(&self) -> bool {
        self.spinner.is_some()
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoadingIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_stop() {
        let mut indicator = LoadingIndicator::new();
        assert!(!indicator.is_running());

        indicator.start("Thinking...");
        assert!(indicator.is_running());

        indicator.start("Still thinking...");
        assert!(indicator.is_running());

        indicator.stop();
        assert!(!indicator.is_running());
    }
}
