use super::*;
use tempfile::TempDir;

#[test]
fn test_defaults_match_constants() {
    let config = AppConfig::default();
    assert_eq!(config.log_level.to_string(), defaults::LOG_LEVEL);
    assert_eq!(config.log_format, defaults::LOG_FORMAT.parse::<LogFormat>().unwrap());
    assert_eq!(config.log_output, defaults::LOG_OUTPUT.parse::<LogOutput>().unwrap());
    assert_eq!(config.color, defaults::COLOR.parse::<ColorIntent>().unwrap());
    assert_eq!(config.output, defaults::OUTPUT.parse::<OutputFormat>().unwrap());
}

#[test]
fn test_logger_config_follows_verbosity() {
    let config = AppConfig {
        log_level: 3,
        log_format: LogFormat::Json,
        color: ColorIntent::Never,
        ..AppConfig::default()
    };

    let logger = config.to_logger_config();
    assert_eq!(logger.level, LogLevel::Debug);
    assert_eq!(logger.format, LogFormat::Json);
    assert!(!logger.color);
}

#[test]
fn test_color_intent_overrides_terminal() {
    let always = AppConfig {
        color: ColorIntent::Always,
        ..AppConfig::default()
    };
    let never = AppConfig {
        color: ColorIntent::Never,
        ..AppConfig::default()
    };
    assert!(always.color_enabled());
    assert!(!never.color_enabled());
}

#[test]
fn test_validate_rejects_missing_workdir() {
    let mut config = AppConfig {
        workdir: Some(PathBuf::from("/definitely/not/a/workspace")),
        ..AppConfig::default()
    };

    match config.validate() {
        Err(ConfigError::InvalidWorkDir { path }) => {
            assert!(path.contains("not/a/workspace"));
        }
        other => panic!("Expected InvalidWorkDir, got {:?}", other),
    }
}

#[test]
fn test_validate_keeps_existing_workdir() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig {
        workdir: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };

    config.validate().unwrap();
    assert_eq!(config.workdir(), dir.path());
}

#[test]
fn test_validate_defaults_to_current_dir() {
    let mut config = AppConfig::default();
    config.validate().unwrap();
    assert!(config.workdir.is_some());
}
