use modgraph_lib::application::config::AppConfig;
use modgraph_lib::application::env::EnvironmentConfig;
use modgraph_lib::primitives::{ColorIntent, ConfigError, LogLevel, OutputFormat};
use tempfile::TempDir;

#[test]
fn test_config_default_creation() {
    let config = AppConfig::default();

    assert!(config.log_level <= 4);
    assert!(config.workdir.is_none());
    assert_eq!(config.color, ColorIntent::Auto);
    assert_eq!(config.output, OutputFormat::Text);
}

#[test]
fn test_config_merging_integration() {
    let base_config = AppConfig::default();
    let override_config = AppConfig {
        log_level: 3,
        color: ColorIntent::Never,
        output: OutputFormat::Json,
        ..AppConfig::default()
    };

    let merged = base_config.merge_with(override_config);

    assert_eq!(merged.log_level, 3);
    assert_eq!(merged.color, ColorIntent::Never);
    assert_eq!(merged.output, OutputFormat::Json);
    assert!(merged.workdir.is_none());
}

#[test]
fn test_resolve_validates_workdir() {
    let dir = TempDir::new().unwrap();
    let cli = AppConfig {
        workdir: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };

    let config = AppConfig::resolve(cli, &EnvironmentConfig::default()).unwrap();
    assert_eq!(config.workdir(), dir.path());
}

#[test]
fn test_resolve_rejects_missing_workdir() {
    let dir = TempDir::new().unwrap();
    let cli = AppConfig {
        workdir: Some(dir.path().join("nope")),
        ..AppConfig::default()
    };

    let result = AppConfig::resolve(cli, &EnvironmentConfig::default());
    assert!(matches!(result, Err(ConfigError::InvalidWorkDir { .. })));
}

#[test]
fn test_logger_config_from_app_config() {
    let config = AppConfig {
        log_level: 2,
        color: ColorIntent::Never,
        ..AppConfig::default()
    };

    let logger = config.to_logger_config();
    assert_eq!(logger.level, LogLevel::from_verbosity(2));
    assert!(!logger.color);
}
