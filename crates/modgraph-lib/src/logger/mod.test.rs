use super::*;

#[test]
fn test_log_context_creation() {
    let context = LogContext::new("open_modules");
    assert_eq!(context.operation, "open_modules");
    assert_eq!(context.total_items, None);
    assert_eq!(context.current_item, None);
}

#[test]
fn test_log_context_with_progress() {
    let mut context = LogContext::with_progress("open_modules", 12);
    assert_eq!(context.total_items, Some(12));

    context.set_progress(5);
    assert_eq!(context.current_item, Some(5));
}

#[test]
fn test_default_directives_scope_our_crates() {
    assert_eq!(
        default_directives(LogLevel::Debug),
        "modgraph=debug,modgraph_lib=debug,warn"
    );
    assert_eq!(
        default_directives(LogLevel::Warning),
        "modgraph=warn,modgraph_lib=warn,warn"
    );
}

#[test]
fn test_default_directives_parse() {
    for level in [
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ] {
        assert!(
            EnvFilter::try_new(default_directives(level)).is_ok(),
            "{:?} should produce a valid filter",
            level
        );
    }
}

#[test]
fn test_global_is_consistent_with_initialized() {
    // Other tests may have installed a subscriber already
    assert_eq!(Logger::is_initialized(), Logger::global().is_some());
}
