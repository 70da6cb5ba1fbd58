// Progress indicators and spinners

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use draftsmith_ollama::PullProgress;

/// Create a spinner for long-running operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|e| {
            eprintln!("Failed to create spinner template: {}", e);
            ProgressStyle::default_spinner()
        });
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Byte-based progress bar driven by pull status updates
pub struct PullProgressBar {
    bar: ProgressBar,
    digest: Option<String>,
}

impl PullProgressBar {
    pub fn new(model: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|e| {
                eprintln!("Failed to create progress bar template: {}", e);
                ProgressStyle::default_bar()
            })
            .progress_chars("=>-");
        bar.set_style(style);
        bar.set_message(format!("Pulling {}", model));
        Self { bar, digest: None }
    }

    /// Apply one status update; each new layer digest restarts the bar
    pub fn update(&mut self, progress: &PullProgress) {
        if progress.digest.is_some() && progress.digest != self.digest {
            self.digest = progress.digest.clone();
            self.bar.reset();
        }
        if progress.total > 0 {
            self.bar.set_length(progress.total);
            self.bar.set_position(progress.completed.min(progress.total));
        }
        self.bar.set_message(progress.status.clone());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
