use super::*;
use crate::primitives::{ColorIntent, OutputFormat};
use tempfile::TempDir;

fn cli_for(dir: &TempDir) -> AppConfig {
    AppConfig {
        workdir: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    }
}

#[test]
fn test_config_loading_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.log_level, 0);
    assert_eq!(config.color, ColorIntent::Auto);
    assert_eq!(config.output, OutputFormat::Text);
}

#[test]
fn test_config_merging() {
    let base = AppConfig::default();
    let override_config = AppConfig {
        log_level: 4,
        color: ColorIntent::Always,
        output: OutputFormat::Json,
        ..AppConfig::default()
    };

    let merged = base.merge_with(override_config);
    assert_eq!(merged.log_level, 4);
    assert_eq!(merged.color, ColorIntent::Always);
    assert_eq!(merged.output, OutputFormat::Json);
    assert!(merged.workdir.is_none());
}

#[test]
fn test_resolve_applies_environment_color() {
    let dir = TempDir::new().unwrap();
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..EnvironmentConfig::default()
    };

    let config = AppConfig::resolve(cli_for(&dir), &env).unwrap();
    assert_eq!(config.color, ColorIntent::Never);
    assert_eq!(config.workdir(), dir.path());
}

#[test]
fn test_resolve_cli_color_beats_environment() {
    let dir = TempDir::new().unwrap();
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..EnvironmentConfig::default()
    };
    let cli = AppConfig {
        color: ColorIntent::Always,
        ..cli_for(&dir)
    };

    let config = AppConfig::resolve(cli, &env).unwrap();
    assert_eq!(config.color, ColorIntent::Always);
}

#[test]
fn test_resolve_validates_workdir() {
    let cli = AppConfig {
        workdir: Some("/no/such/workspace".into()),
        ..AppConfig::default()
    };
    assert!(matches!(
        AppConfig::resolve(cli, &EnvironmentConfig::default()),
        Err(ConfigError::InvalidWorkDir { .. })
    ));
}
