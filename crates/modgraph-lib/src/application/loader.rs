//! Configuration loading and global state management
//!
//! Coordinates loading configuration from various sources and provides
//! global application configuration access.

use crate::primitives::ConfigError;
use std::sync::OnceLock;

use super::{cli::CliConfig, config::AppConfig, env::EnvironmentConfig};

// Global configuration available throughout the application
static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Dotenv files read at startup, most specific first
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

impl AppConfig {
    /// Load config: defaults -> .env -> env vars -> CLI
    pub fn load() -> Result<(Self, CliConfig), ConfigError> {
        load_env_files()?;

        let cli = CliConfig::load()?;
        let config = Self::resolve(cli.app_config.clone(), &EnvironmentConfig::load()?)?;
        Ok((config, cli))
    }

    /// Layer CLI/env-var values and standard color variables over the defaults
    pub fn resolve(cli: AppConfig, env: &EnvironmentConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.color = env.apply_color_config(config.color);
        config = config.merge_with(cli);
        config.validate()?;
        Ok(config)
    }

    /// Initialize global configuration (call once in main)
    pub fn init_global(config: AppConfig) -> Result<(), ConfigError> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| ConfigError::AlreadyInitialized)
    }

    /// Global configuration, if `init_global` has run
    pub fn global() -> Option<&'static AppConfig> {
        GLOBAL_CONFIG.get()
    }
}

/// Read dotenv files. Missing files are fine; unreadable ones are not.
fn load_env_files() -> Result<(), ConfigError> {
    for env_file in ENV_FILES {
        match dotenvy::from_filename(env_file) {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::EnvFileError {
                    file: env_file.to_string(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
