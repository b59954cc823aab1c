//! Terminal display system
//!
//! User-facing output, kept apart from logging: status lines for command
//! results and progress bars for bulk module opens.

pub mod progress;
pub mod status;
pub mod styling;

pub use progress::{ProgressDisplay, ProgressTracker};
pub use status::StatusDisplay;
pub use styling::StyleManager;

use std::io::Write;

/// Display manager handed to command handlers
#[derive(Debug, Clone)]
pub struct Display {
    styling: StyleManager,
    interactive: bool,
}

impl Display {
    pub fn new(styling: StyleManager, interactive: bool) -> Self {
        Self {
            styling,
            interactive,
        }
    }

    /// Display for a real terminal session
    pub fn detect(color: bool) -> Self {
        Self::new(StyleManager::detect(color), console::user_attended_stderr())
    }

    /// No color, ASCII glyphs, no progress bars
    pub fn plain() -> Self {
        Self::new(StyleManager::plain(), false)
    }

    pub fn status<W: Write>(&self, out: W) -> StatusDisplay<'_, W> {
        StatusDisplay::new(&self.styling, out)
    }

    pub fn progress(&self) -> ProgressDisplay<'_> {
        ProgressDisplay::new(&self.styling, self.interactive)
    }

    pub fn styling(&self) -> &StyleManager {
        &self.styling
    }
}
