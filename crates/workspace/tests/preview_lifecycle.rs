use std::time::Instant;

use flume::Receiver;
use querydesk_search::{
    BufferEvent, BufferHost, ClickKind, DEFAULT_DEBOUNCE, SearchController, Span,
};
use querydesk_workspace::{TabKind, Workspace, render_panel};

fn drain(
    controller: &mut SearchController,
    workspace: &Workspace,
    events: &Receiver<BufferEvent>,
    now: Instant,
) {
    for event in events.try_iter() {
        controller.buffers_changed(event, now);
    }
    controller.poll(workspace, now + DEFAULT_DEBOUNCE);
}

#[test]
fn closed_result_previews_then_commits() {
    let mut workspace = Workspace::default();
    let events = workspace.subscribe();
    let open = workspace.open_tab(Some("daily"), "select * from trades").unwrap();
    let old = workspace.open_tab(Some("archive"), "-- old\nselect price from trades").unwrap();
    workspace.close_tab(old).unwrap();
    let _ = events.try_iter().count();

    let mut controller = SearchController::default();
    let now = Instant::now();
    controller.set_query("price", now);
    controller.submit(&workspace);
    assert_eq!(controller.results().groups[0].buffer_id, old);
    assert!(controller.results().groups[0].is_closed);

    // single click: preview with highlight, not a permanent tab
    assert!(controller.activate(&mut workspace, 0, ClickKind::Single));
    assert_eq!(workspace.tab_kind(old), Some(TabKind::Preview));
    assert_eq!(workspace.active(), Some(old));
    assert_eq!(workspace.highlight(old), Some(Span::new(14, 19)));
    assert_eq!(workspace.tabs().len(), 2);

    drain(&mut controller, &workspace, &events, now);
    let rendered = render_panel(controller.results(), controller.navigator(), controller.preview());
    assert!(rendered.contains("[preview] archive"), "{rendered}");

    // double click: permanent, highlight gone
    assert!(controller.activate(&mut workspace, 0, ClickKind::Double));
    assert_eq!(workspace.tab_kind(old), Some(TabKind::Permanent));
    assert_eq!(workspace.highlight(old), None);
    assert_eq!(workspace.preview(), None);
    assert_eq!(workspace.tabs().last().map(|b| b.id), Some(old));
    assert!(workspace.request_activate(open).is_ok());
}

#[test]
fn second_preview_sends_first_back_to_closed() {
    let mut workspace = Workspace::default();
    let a = workspace.open_tab(Some("a"), "needle one").unwrap();
    let b = workspace.open_tab(Some("b"), "needle two").unwrap();
    workspace.open_tab(Some("c"), "").unwrap();
    workspace.close_tab(a).unwrap();
    workspace.close_tab(b).unwrap();

    let mut controller = SearchController::default();
    controller.set_query("needle", Instant::now());
    controller.submit(&workspace);
    // most recently closed first
    assert_eq!(controller.results().groups[0].buffer_id, b);

    controller.activate(&mut workspace, 0, ClickKind::Single);
    controller.activate(&mut workspace, 1, ClickKind::Single);

    assert_eq!(workspace.preview(), Some(a));
    assert_eq!(workspace.tab_kind(b), None);
    assert_eq!(controller.preview(), Some(a));
}

#[test]
fn typing_in_preview_commits_it() {
    let mut workspace = Workspace::default();
    let events = workspace.subscribe();
    let old = workspace.open_tab(Some("old"), "needle").unwrap();
    workspace.open_tab(None, "").unwrap();
    workspace.close_tab(old).unwrap();

    let mut controller = SearchController::default();
    let now = Instant::now();
    controller.set_query("needle", now);
    controller.submit(&workspace);
    controller.activate(&mut workspace, 0, ClickKind::Single);

    workspace.edit(old, "needle and more needle").unwrap();
    drain(&mut controller, &workspace, &events, now);

    assert_eq!(workspace.tab_kind(old), Some(TabKind::Permanent));
    assert_eq!(controller.preview(), None);
    assert_eq!(controller.results().summary().as_deref(), Some("2 results in 1 tab"));
}

#[test]
fn clicking_open_result_keeps_preview_tab() {
    let mut workspace = Workspace::default();
    workspace.open_tab(Some("daily"), "select needle").unwrap();
    let old = workspace.open_tab(Some("old"), "needle").unwrap();
    workspace.close_tab(old).unwrap();

    let mut controller = SearchController::default();
    controller.set_query("needle", Instant::now());
    controller.submit(&workspace);
    // open tab first, closed second
    assert!(controller.activate(&mut workspace, 1, ClickKind::Single));
    assert_eq!(workspace.preview(), Some(old));

    assert!(controller.activate(&mut workspace, 0, ClickKind::Single));
    assert_eq!(workspace.tab_kind(old), Some(TabKind::Preview));
    assert_eq!(workspace.tabs().len(), 2);
    assert_eq!(controller.preview(), Some(old));
    assert_eq!(workspace.highlight(workspace.tabs()[0].id), Some(Span::new(7, 13)));
}
