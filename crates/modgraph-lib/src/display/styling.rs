//! Terminal-aware styling
//!
//! Semantic colors and symbols on top of `console::Style`. With color off,
//! every `style_*` call returns the text unchanged.

use console::Style;

/// Symbols for one glyph set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub checkmark: &'static str,
    pub cross: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub bullet: &'static str,
    pub arrow: &'static str,
}

pub const UNICODE_SYMBOLS: Symbols = Symbols {
    checkmark: "✓",
    cross: "✗",
    warning: "⚠",
    info: "ℹ",
    bullet: "•",
    arrow: "→",
};

pub const ASCII_SYMBOLS: Symbols = Symbols {
    checkmark: "+",
    cross: "x",
    warning: "!",
    info: "i",
    bullet: "-",
    arrow: "->",
};

/// Style manager for user-facing output
#[derive(Debug, Clone)]
pub struct StyleManager {
    color: bool,
    symbols: Symbols,
}

impl StyleManager {
    pub fn new(color: bool, unicode: bool) -> Self {
        Self {
            color,
            symbols: if unicode {
                UNICODE_SYMBOLS
            } else {
                ASCII_SYMBOLS
            },
        }
    }

    /// Plain ASCII output, as used for pipes and tests
    pub fn plain() -> Self {
        Self::new(false, false)
    }

    /// Color as requested; glyphs as the stdout terminal supports
    pub fn detect(color: bool) -> Self {
        Self::new(color, console::Term::stdout().features().wants_emoji())
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn is_unicode(&self) -> bool {
        self.symbols == UNICODE_SYMBOLS
    }

    fn apply(&self, style: Style, text: &str) -> String {
        if self.color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn style_success(&self, text: &str) -> String {
        self.apply(Style::new().green(), text)
    }

    pub fn style_error(&self, text: &str) -> String {
        self.apply(Style::new().red(), text)
    }

    pub fn style_warning(&self, text: &str) -> String {
        self.apply(Style::new().yellow(), text)
    }

    pub fn style_info(&self, text: &str) -> String {
        self.apply(Style::new().cyan(), text)
    }

    pub fn style_emphasis(&self, text: &str) -> String {
        self.apply(Style::new().bold(), text)
    }

    pub fn style_subtle(&self, text: &str) -> String {
        self.apply(Style::new().dim(), text)
    }

    /// Format success message with symbol and styling
    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_success(self.symbols.checkmark), message)
    }

    /// Format error message with symbol and styling
    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_error(self.symbols.cross), message)
    }

    /// Format warning message with symbol and styling
    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_warning(self.symbols.warning), message)
    }

    /// Format info message with symbol and styling
    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_info(self.symbols.info), message)
    }

    pub fn bullet(&self) -> &'static str {
        self.symbols.bullet
    }

    pub fn arrow(&self) -> &'static str {
        self.symbols.arrow
    }
}

#[cfg(test)]
mod tests {
    include!("styling.test.rs");
}
