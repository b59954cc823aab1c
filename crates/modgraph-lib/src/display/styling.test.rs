use super::*;

#[test]
fn test_plain_styling_leaves_text_untouched() {
    let styling = StyleManager::plain();
    assert_eq!(styling.style_success("ok"), "ok");
    assert_eq!(styling.style_emphasis("title"), "title");
    assert_eq!(styling.format_success("done"), "+ done");
    assert_eq!(styling.format_error("failed"), "x failed");
    assert_eq!(styling.arrow(), "->");
    assert!(!styling.is_unicode());
}

#[test]
fn test_colored_styling_adds_escape_codes() {
    let styling = StyleManager::new(true, true);
    let styled = styling.style_error("boom");

    assert!(styled.contains("boom"));
    assert!(styled.contains('\u{1b}'));
    assert_eq!(console::strip_ansi_codes(&styled), "boom");
    assert!(styling.format_success("ok").ends_with("ok"));
    assert!(styling.is_unicode());
}

#[test]
fn test_unicode_without_color() {
    let styling = StyleManager::new(false, true);
    assert_eq!(styling.format_warning("careful"), "⚠ careful");
    assert_eq!(styling.bullet(), "•");
}
