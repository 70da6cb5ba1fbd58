// Output formatting and styling

use std::io::IsTerminal;

use colored::Colorize;
use draftsmith_content::{GenerationRecord, GenerationStats, GenerationStatus};
use draftsmith_ollama::{HealthReport, ModelDescriptor};

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: std::io::stdout().is_terminal(),
        }
    }
}

impl OutputStyle {
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    /// Format success message
    pub fn success(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✓".green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format warning message
    pub fn warning(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "⚠".yellow(), msg)
        } else {
            format!("⚠ {}", msg)
        }
    }

    /// Format info message
    pub fn info(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "ℹ".blue(), msg)
        } else {
            format!("ℹ {}", msg)
        }
    }

    /// Format a section header
    pub fn section(&self, title: &str) -> String {
        if self.use_colors {
            format!(
                "\n{}\n{}",
                title.bold().underline(),
                "─".repeat(title.chars().count())
            )
        } else {
            format!("\n{}\n{}", title, "─".repeat(title.chars().count()))
        }
    }

    /// Format a key-value pair
    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.use_colors {
            format!("  {}: {}", key.bold(), value)
        } else {
            format!("  {}: {}", key, value)
        }
    }

    pub fn status(&self, status: GenerationStatus) -> String {
        if !self.use_colors {
            return status.to_string();
        }
        match status {
            GenerationStatus::Completed => status.as_str().green().to_string(),
            GenerationStatus::Failed => status.as_str().red().to_string(),
            GenerationStatus::Pending | GenerationStatus::Generating => {
                status.as_str().yellow().to_string()
            }
        }
    }

    pub fn health(&self, report: &HealthReport) -> String {
        match &report.error {
            None => self.success(&format!(
                "Ollama is reachable ({} model{} installed)",
                report.models.len(),
                if report.models.len() == 1 { "" } else { "s" }
            )),
            Some(error) => self.error(error),
        }
    }

    /// One line per model: name, size, modification date
    pub fn model_table(&self, models: &[ModelDescriptor]) -> String {
        let width = models
            .iter()
            .map(|m| m.name.chars().count())
            .max()
            .unwrap_or(4)
            .max(4);

        let mut lines = vec![format!("{:<width$}  {:>9}  {}", "NAME", "SIZE", "MODIFIED")];
        for model in models {
            lines.push(format!(
                "{:<width$}  {:>9}  {}",
                model.name,
                model.formatted_size(),
                model.modified_at.format("%Y-%m-%d %H:%M")
            ));
        }
        lines.join("\n")
    }

    /// Compact history line: time, status, type, model, prompt excerpt
    pub fn record_line(&self, record: &GenerationRecord) -> String {
        format!(
            "{}  {:<10}  {:<7}  {:<16}  {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            self.status(record.status),
            record.content_type,
            record.model,
            excerpt(&record.prompt, 48)
        )
    }

    pub fn stats(&self, stats: &GenerationStats) -> String {
        let mut lines = vec![
            self.key_value("Total", &stats.total.to_string()),
            self.key_value("Completed", &stats.completed.to_string()),
            self.key_value("Failed", &stats.failed.to_string()),
            self.key_value(
                "Success rate",
                &format!("{:.0}%", stats.success_rate() * 100.0),
            ),
            self.key_value("Average time", &format!("{:.0} ms", stats.average_time_ms)),
        ];

        let mut breakdown: Vec<_> = stats.content_type_breakdown.iter().collect();
        breakdown.sort_by(|a, b| b.1.cmp(a.1).then(a.0.as_str().cmp(b.0.as_str())));
        for (content_type, count) in breakdown {
            lines.push(self.key_value(&format!("  {}", content_type), &count.to_string()));
        }
        lines.join("\n")
    }
}

/// First `max` characters of `text` on one line, with an ellipsis when cut
pub fn excerpt(text: &str, max: usize) -> String {
    let single_line: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Print formatted output
pub fn print_success(msg: &str) {
    println!("{}", OutputStyle::default().success(msg));
}

pub fn print_error(msg: &str) {
    eprintln!("{}", OutputStyle::default().error(msg));
}

pub fn print_warning(msg: &str) {
    eprintln!("{}", OutputStyle::default().warning(msg));
}

pub fn print_info(msg: &str) {
    println!("{}", OutputStyle::default().info(msg));
}
