//! Application configuration management
//!
//! Handles config loading, validation, and environment variable processing
//! following the precedence: defaults -> .env -> env vars -> CLI args.

use crate::primitives::*;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Default configuration values
pub mod defaults {
    pub const LOG_LEVEL: &str = "0"; // Error-only logging by default
    pub const LOG_FORMAT: &str = "text";
    pub const LOG_OUTPUT: &str = "stderr";
    pub const COLOR: &str = "auto";
    pub const OUTPUT: &str = "text";
}

/// Default value functions for configuration fields
mod default_fns {
    use super::*;

    pub fn log_level() -> u8 {
        0
    }

    pub fn log_format() -> LogFormat {
        LogFormat::Text
    }

    pub fn log_output() -> LogOutput {
        LogOutput::Stderr
    }

    pub fn color() -> ColorIntent {
        ColorIntent::Auto
    }

    pub fn output() -> OutputFormat {
        OutputFormat::Text
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Parser, Deserialize)]
pub struct AppConfig {
    /// Workspace root containing workspace.yml
    #[arg(short, long, global = true, env = "MODGRAPH_WORKDIR")]
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Verbosity level (0=error, 1=warn, 2=info, 3=debug, 4=trace)
    #[arg(long, global = true, env = "MODGRAPH_LOG_LEVEL", default_value = defaults::LOG_LEVEL)]
    #[serde(default = "default_fns::log_level")]
    pub log_level: u8,

    /// Log format (text, json, yaml)
    #[arg(long, global = true, env = "MODGRAPH_LOG_FORMAT", default_value = defaults::LOG_FORMAT)]
    #[serde(default = "default_fns::log_format")]
    pub log_format: LogFormat,

    /// Log output stream (stderr, stdout)
    #[arg(long, global = true, env = "MODGRAPH_LOG_OUTPUT", default_value = defaults::LOG_OUTPUT)]
    #[serde(default = "default_fns::log_output")]
    pub log_output: LogOutput,

    /// Color output control (auto, always, never)
    #[arg(short, long, global = true, env = "MODGRAPH_COLOR", default_value = defaults::COLOR)]
    #[serde(default = "default_fns::color")]
    pub color: ColorIntent,

    /// Result rendering (text, json)
    #[arg(short, long, global = true, env = "MODGRAPH_OUTPUT", default_value = defaults::OUTPUT)]
    #[serde(default = "default_fns::output")]
    pub output: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workdir: None,
            log_level: default_fns::log_level(),
            log_format: default_fns::log_format(),
            log_output: default_fns::log_output(),
            color: default_fns::color(),
            output: default_fns::output(),
        }
    }
}

impl AppConfig {
    /// Whether styled output should be emitted, resolving `auto` against the terminal
    pub fn color_enabled(&self) -> bool {
        match self.color {
            ColorIntent::Always => true,
            ColorIntent::Never => false,
            ColorIntent::Auto => console::colors_enabled_stderr(),
        }
    }

    pub fn to_logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            level: LogLevel::from_verbosity(self.log_level),
            format: self.log_format,
            output: self.log_output,
            color: self.color_enabled(),
        }
    }

    /// Merge this config with another, taking non-default values from other
    pub fn merge_with(mut self, other: Self) -> Self {
        if other.workdir.is_some() {
            self.workdir = other.workdir;
        }
        if other.log_level != default_fns::log_level() {
            self.log_level = other.log_level;
        }
        if !matches!(other.log_format, LogFormat::Text) {
            self.log_format = other.log_format;
        }
        if !matches!(other.log_output, LogOutput::Stderr) {
            self.log_output = other.log_output;
        }
        if !matches!(other.color, ColorIntent::Auto) {
            self.color = other.color;
        }
        if !matches!(other.output, OutputFormat::Text) {
            self.output = other.output;
        }

        self
    }

    /// Validate the final configuration
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let workdir = match self.workdir.take() {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| ConfigError::CurrentDirError { source: e })?,
        };

        if !workdir.is_dir() {
            return Err(ConfigError::InvalidWorkDir {
                path: workdir.display().to_string(),
            });
        }

        self.workdir = Some(workdir);
        Ok(())
    }

    /// Workspace root; current directory until `validate` has run
    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
