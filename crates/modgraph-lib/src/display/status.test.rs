use super::*;

fn render(f: impl FnOnce(&mut StatusDisplay<'_, &mut Vec<u8>>) -> io::Result<()>) -> String {
    let styling = StyleManager::plain();
    let mut buffer = Vec::new();
    let mut status = StatusDisplay::new(&styling, &mut buffer);
    f(&mut status).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[test]
fn test_status_lines() {
    let output = render(|s| {
        s.success("core", "resolved")?;
        s.error("app", "")?;
        s.warning("identity collision")?;
        s.info("3 modules")
    });

    assert_eq!(
        output,
        "+ core: resolved\nx app\n! identity collision\ni 3 modules\n"
    );
}

#[test]
fn test_list_and_section() {
    let output = render(|s| {
        s.section("app")?;
        s.list(&["core", "ui"])
    });

    assert_eq!(output, "\napp\n  - core\n  - ui\n");
}

#[test]
fn test_plain_message_passthrough() {
    let output = render(|s| {
        s.message("modgraph")?;
        s.subtle("dim")?;
        s.emphasis("bold")
    });
    assert_eq!(output, "modgraph\ndim\nbold\n");
}
