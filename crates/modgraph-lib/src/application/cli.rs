use crate::primitives::ConfigError;
use clap::{Parser, Subcommand};

use super::config::AppConfig;

/// modgraph CLI - workspace library resolution
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "modgraph")]
#[command(about = "Resolve library dependencies between workspace modules")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration options
    #[command(flatten)]
    pub config: AppConfig,

    /// modgraph commands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration loaded from CLI
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Option<Commands>,
}

impl CliConfig {
    /// Load configuration from command line arguments
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::from_cli(Cli::parse()))
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self {
            app_config: cli.config,
            command: cli.command,
        }
    }
}

/// Available modgraph commands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Show each module's resolved libraries in priority order
    Resolve {
        /// Only show these modules
        #[arg(help = "Module directories to show (default: all)")]
        modules: Vec<String>,
    },

    /// List modules that depend on a module, directly or transitively
    Dependents {
        #[arg(help = "Module directory to inspect")]
        module: String,
    },

    /// Report missing libraries, identity collisions, and cycles
    Check,

    /// Print a libraries-first build order
    Order,

    /// Show version information
    Version,
}

impl Commands {
    /// Whether the command reads workspace.yml
    pub fn requires_workspace(&self) -> bool {
        !matches!(self, Commands::Version)
    }
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
