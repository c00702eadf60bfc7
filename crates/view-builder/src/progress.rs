//! Build progress reporting
//!
//! A progress bar is drawn when the record count is known up front; otherwise progress is
//! logged every `interval` records.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Create a progress bar with custom message
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Tracks records processed by one build
pub struct BuildProgress {
    dataset: String,
    bar: ProgressBar,
    interval: u64,
    processed: u64,
}

impl BuildProgress {
    pub fn new(dataset: &str, total: Option<u64>, interval: u64, draw: bool) -> Self {
        let bar = match total {
            Some(total) if draw => create_progress_bar(total, &format!("Building {dataset}")),
            _ => ProgressBar::hidden(),
        };
        Self {
            dataset: dataset.to_string(),
            bar,
            interval,
            processed: 0,
        }
    }

    /// Hidden progress that only logs
    pub fn quiet(dataset: &str, interval: u64) -> Self {
        Self::new(dataset, None, interval, false)
    }

    pub fn record(&mut self) {
        self.processed += 1;
        self.bar.inc(1);
        if self.bar.is_hidden() && self.interval > 0 && self.processed % self.interval == 0 {
            info!("{}: {} records processed", self.dataset, self.processed);
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
