use super::*;
use parking_lot::Mutex;
use std::env;

// Process environment is shared between test threads
static ENV_LOCK: Mutex<()> = Mutex::new(());

const COLOR_VARS: [&str; 4] = ["NO_COLOR", "FORCE_COLOR", "CLICOLOR", "CI"];

fn clean_color_env() {
    unsafe {
        for var in COLOR_VARS {
            env::remove_var(var);
        }
    }
}

fn env_with(no_color: Option<&str>, force_color: Option<&str>, clicolor: Option<&str>) -> EnvironmentConfig {
    EnvironmentConfig {
        no_color: no_color.map(str::to_string),
        force_color: force_color.map(str::to_string),
        clicolor: clicolor.map(str::to_string),
        ci: None,
    }
}

#[test]
fn test_no_color_environment_variable() {
    let _guard = ENV_LOCK.lock();
    clean_color_env();
    unsafe {
        env::set_var("NO_COLOR", "1");
    }

    let env_config = EnvironmentConfig::load().unwrap();
    assert_eq!(env_config.apply_color_config(ColorIntent::Auto), ColorIntent::Never);

    clean_color_env();
}

#[test]
fn test_ci_environment_variable() {
    let _guard = ENV_LOCK.lock();
    clean_color_env();
    unsafe {
        env::set_var("CI", "true");
        env::set_var("FORCE_COLOR", "1");
    }

    let env_config = EnvironmentConfig::load().unwrap();
    assert_eq!(env_config.apply_color_config(ColorIntent::Always), ColorIntent::Never);

    clean_color_env();
}

#[test]
fn test_force_color_wins_over_disabling_variables() {
    let config = env_with(Some("1"), Some("1"), Some("0"));
    assert_eq!(config.apply_color_config(ColorIntent::Auto), ColorIntent::Always);

    let config = env_with(None, Some("false"), None);
    assert_eq!(config.apply_color_config(ColorIntent::Always), ColorIntent::Never);
}

#[test]
fn test_empty_no_color_is_ignored() {
    let config = env_with(Some(""), None, None);
    assert_eq!(config.apply_color_config(ColorIntent::Auto), ColorIntent::Auto);
}

#[test]
fn test_clicolor_zero_disables() {
    let config = env_with(None, None, Some("0"));
    assert_eq!(config.apply_color_config(ColorIntent::Always), ColorIntent::Never);

    let config = env_with(None, None, Some("1"));
    assert_eq!(config.apply_color_config(ColorIntent::Always), ColorIntent::Always);
}

#[test]
fn test_unknown_force_color_value_ignored() {
    let config = env_with(None, Some("maybe"), None);
    assert_eq!(config.apply_color_config(ColorIntent::Never), ColorIntent::Never);
}

#[test]
fn test_empty_environment_changes_nothing() {
    let config = EnvironmentConfig::default();
    for intent in [ColorIntent::Auto, ColorIntent::Always, ColorIntent::Never] {
        assert_eq!(config.apply_color_config(intent), intent);
    }
}
