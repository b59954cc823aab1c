use super::*;

#[test]
fn test_hidden_bar_tracks_position() {
    let styling = StyleManager::plain();
    let progress = ProgressDisplay::new(&styling, false);

    let tracker = progress.bar(3, "Opening modules");
    tracker.tick("core");
    tracker.tick("ui");
    assert_eq!(tracker.position(), 2);
    tracker.finish_clear();
}

#[test]
fn test_unicode_bar_builds() {
    let styling = StyleManager::new(false, true);
    let progress = ProgressDisplay::new(&styling, false);

    let tracker = progress.bar(1, "Opening modules");
    tracker.tick("app");
    tracker.finish("Opened 1 module");
    assert_eq!(tracker.position(), 1);
}
