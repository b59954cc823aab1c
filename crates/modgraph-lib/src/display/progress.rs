//! Progress display for long-running operations
//!
//! Progress bars using indicatif with terminal-capability-aware styling.
//! Bars draw to stderr and stay hidden when it is not a terminal.

use super::styling::StyleManager;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const UNICODE_TICKS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ASCII_TICKS: [&str; 4] = ["-", "\\", "|", "/"];

/// Progress display manager for long-running operations
pub struct ProgressDisplay<'a> {
    styling: &'a StyleManager,
    visible: bool,
}

impl<'a> ProgressDisplay<'a> {
    pub fn new(styling: &'a StyleManager, visible: bool) -> Self {
        Self { styling, visible }
    }

    /// Progress bar for operations with a known total
    pub fn bar(&self, total: u64, message: &str) -> ProgressTracker<'a> {
        let pb = if self.visible {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };

        let style = if self.styling.is_unicode() {
            ProgressStyle::with_template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len}")
                .map(|s| s.tick_strings(&UNICODE_TICKS).progress_chars("█▉▊▋▌▍▎▏  "))
        } else {
            ProgressStyle::with_template("{spinner} {msg} [{wide_bar}] {pos}/{len}")
                .map(|s| s.tick_strings(&ASCII_TICKS).progress_chars("##-"))
        };

        pb.set_style(style.unwrap_or_else(|_| ProgressStyle::default_bar()));
        pb.set_length(total);
        pb.set_message(message.to_string());
        if self.visible {
            pb.enable_steady_tick(Duration::from_millis(100));
        }

        ProgressTracker {
            bar: pb,
            styling: self.styling,
        }
    }
}

/// Individual progress tracker
pub struct ProgressTracker<'a> {
    bar: ProgressBar,
    styling: &'a StyleManager,
}

impl ProgressTracker<'_> {
    /// Advance by one and show `item`
    pub fn tick(&self, item: &str) {
        self.bar.inc(1);
        self.bar.set_message(item.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish with success message
    pub fn finish(&self, message: &str) {
        self.bar
            .finish_with_message(self.styling.format_success(message));
    }

    /// Finish and clear the progress bar
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    include!("progress.test.rs");
}
