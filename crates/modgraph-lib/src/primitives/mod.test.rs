use super::*;

// =============================================================================
// LEVEL A: EXHAUSTIVE DATA TYPE TESTING
// =============================================================================

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let debug_str = format!("{:?}", variant);
                assert!(!debug_str.is_empty(), "Debug output should not be empty");

                let possible_value = variant.to_possible_value();
                assert!(
                    possible_value.is_some(),
                    "PossibleValue should exist for all variants"
                );

                // Round-trip through the primary name
                let possible_val = possible_value.unwrap();
                let primary_name = possible_val.get_name();
                let parsed: Result<$enum_type, _> = primary_name.parse();
                assert_eq!(
                    parsed.unwrap(),
                    *variant,
                    "Round-trip should preserve variant"
                );
            }
        }
    };
}

macro_rules! test_fromstr_aliases {
    ($enum_type:ty, $test_name:ident, $expected_mappings:expr) => {
        #[test]
        fn $test_name() {
            let mappings: &[(&str, $enum_type)] = &$expected_mappings;

            for (input, expected) in mappings {
                let parsed: Result<$enum_type, _> = input.parse();
                assert_eq!(
                    parsed.unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e)),
                    *expected,
                    "Wrong variant for input '{}'",
                    input
                );
            }
        }
    };
}

test_enum_completeness!(LogLevel, test_log_level_completeness);
test_enum_completeness!(LogFormat, test_log_format_completeness);
test_enum_completeness!(LogOutput, test_log_output_completeness);
test_enum_completeness!(ColorIntent, test_color_intent_completeness);
test_enum_completeness!(OutputFormat, test_output_format_completeness);

test_fromstr_aliases!(
    LogLevel,
    test_log_level_aliases,
    [
        ("error", LogLevel::Error),
        ("err", LogLevel::Error),
        ("fatal", LogLevel::Error),
        ("warn", LogLevel::Warning),
        ("warning", LogLevel::Warning),
        ("info", LogLevel::Info),
        ("debug", LogLevel::Debug),
        ("trace", LogLevel::Trace),
        ("verbose", LogLevel::Trace),
    ]
);

test_fromstr_aliases!(
    LogFormat,
    test_log_format_aliases,
    [
        ("text", LogFormat::Text),
        ("plain", LogFormat::Text),
        ("json", LogFormat::Json),
        ("yml", LogFormat::Yaml),
    ]
);

test_fromstr_aliases!(
    ColorIntent,
    test_color_intent_aliases,
    [
        ("auto", ColorIntent::Auto),
        ("detect", ColorIntent::Auto),
        ("always", ColorIntent::Always),
        ("on", ColorIntent::Always),
        ("never", ColorIntent::Never),
        ("off", ColorIntent::Never),
    ]
);

// =============================================================================
// LEVEL B: BEHAVIORS
// =============================================================================

#[test]
fn test_unknown_value_is_parse_error() {
    let err = "loud".parse::<LogLevel>().unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { ref value, .. } if value == "loud"));
    assert!(err.to_string().contains("invalid log level"));
}

#[test]
fn test_log_level_from_verbosity_boundary_conditions() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Error);
    assert_eq!(LogLevel::from_verbosity(1), LogLevel::Warning);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(3), LogLevel::Debug);
    assert_eq!(LogLevel::from_verbosity(4), LogLevel::Trace);
    assert_eq!(LogLevel::from_verbosity(u8::MAX), LogLevel::Trace);
}

#[test]
fn test_log_level_should_log_matrix() {
    let levels = [
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    for (i, message_level) in levels.iter().enumerate() {
        for (j, current_level) in levels.iter().enumerate() {
            assert_eq!(message_level.should_log(*current_level), i <= j);
        }
    }
}

#[test]
fn test_filter_directives() {
    assert_eq!(LogLevel::Warning.as_filter_directive(), "warn");
    assert_eq!(LogLevel::Trace.as_filter_directive(), "trace");
}

#[test]
fn test_log_context_progress() {
    let mut context = LogContext::with_progress("open_modules", 3);
    assert_eq!(context.total_items, Some(3));
    assert_eq!(context.current_item, None);
    context.set_progress(2);
    assert_eq!(context.current_item, Some(2));
}

#[test]
fn test_config_error_display() {
    let error = ConfigError::AlreadyInitialized;
    assert_eq!(
        error.to_string(),
        "Global configuration already initialized"
    );

    let error = ConfigError::InvalidWorkDir {
        path: "/invalid/path".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Invalid working directory: /invalid/path"
    );
}
