//! Status display for user feedback
//!
//! Semantic status lines written to any `io::Write`, so command output can be
//! captured in tests.

use super::styling::StyleManager;
use std::io::{self, Write};

/// Status display manager for semantic user feedback
pub struct StatusDisplay<'a, W: Write> {
    styling: &'a StyleManager,
    out: W,
}

impl<'a, W: Write> StatusDisplay<'a, W> {
    pub fn new(styling: &'a StyleManager, out: W) -> Self {
        Self { styling, out }
    }

    /// `✓ item: details`
    pub fn success(&mut self, item: &str, details: &str) -> io::Result<()> {
        let line = self.styling.format_success(&join(item, details));
        writeln!(self.out, "{}", line)
    }

    /// `✗ item: details`
    pub fn error(&mut self, item: &str, details: &str) -> io::Result<()> {
        let line = self.styling.format_error(&join(item, details));
        writeln!(self.out, "{}", line)
    }

    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        let line = self.styling.format_warning(message);
        writeln!(self.out, "{}", line)
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        let line = self.styling.format_info(message);
        writeln!(self.out, "{}", line)
    }

    pub fn message(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn emphasis(&mut self, text: &str) -> io::Result<()> {
        let line = self.styling.style_emphasis(text);
        writeln!(self.out, "{}", line)
    }

    pub fn subtle(&mut self, text: &str) -> io::Result<()> {
        let line = self.styling.style_subtle(text);
        writeln!(self.out, "{}", line)
    }

    /// Bulleted items, indented under the previous line
    pub fn list<S: AsRef<str>>(&mut self, items: &[S]) -> io::Result<()> {
        for item in items {
            writeln!(self.out, "  {} {}", self.styling.bullet(), item.as_ref())?;
        }
        Ok(())
    }

    /// Blank line and an emphasized title
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.emphasis(title)
    }

    pub fn styling(&self) -> &StyleManager {
        self.styling
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn join(item: &str, details: &str) -> String {
    if details.is_empty() {
        item.to_string()
    } else {
        format!("{}: {}", item, details)
    }
}

#[cfg(test)]
mod tests {
    include!("status.test.rs");
}
