use super::fakes::{new_log, FakeNode};
use crate::errors::AutomationError;
use crate::paths::{PathStep, UiPath};
use crate::tree::{has_descendant_titled, resolve, resolve_all};

const TWO_DEEP: UiPath = UiPath::new(
    "second text box",
    &[
        PathStep::class("Pane"),
        PathStep::class("TextBox").nth(1),
    ],
);

#[test]
fn resolve_walks_class_and_index_filters() {
    let log = new_log();
    let window = FakeNode::new("Window", "", &log).child(
        FakeNode::new("Pane", "", &log)
            .child(FakeNode::new("TextBox", "", &log).value("first"))
            .child(FakeNode::new("Button", "", &log))
            .child(FakeNode::new("TextBox", "", &log).value("second")),
    );

    let node = resolve(&window, &TWO_DEEP).unwrap();
    assert_eq!(node.text().unwrap(), "second");
}

#[test]
fn resolve_reports_the_named_path_on_failure() {
    let log = new_log();
    let window = FakeNode::new("Window", "", &log).child(FakeNode::new("Pane", "", &log));

    match resolve(&window, &TWO_DEEP).unwrap_err() {
        AutomationError::ElementNotFound(message) => {
            assert!(message.contains("second text box"), "got: {message}");
        }
        other => panic!("expected ElementNotFound, got {other:?}"),
    }
}

#[test]
fn title_filter_distinguishes_same_class_siblings() {
    let log = new_log();
    let window = FakeNode::new("Window", "", &log)
        .child(FakeNode::new("Expander", "Live Video", &log))
        .child(
            FakeNode::new("Expander", "Recorded Video", &log)
                .child(FakeNode::new("TextBox", "", &log).value("range")),
        );

    const RECORDED_BOX: UiPath = UiPath::new(
        "recorded range box",
        &[
            PathStep::class("Expander").titled("Recorded Video"),
            PathStep::class("TextBox"),
        ],
    );
    let node = resolve(&window, &RECORDED_BOX).unwrap();
    assert_eq!(node.text().unwrap(), "range");
}

#[test]
fn resolve_all_enumerates_final_step_and_tolerates_zero() {
    let log = new_log();
    let window = FakeNode::new("Window", "", &log).child(
        FakeNode::new("Pane", "", &log)
            .child(FakeNode::new("TabItem", "", &log))
            .child(FakeNode::new("TabItem", "", &log))
            .child(FakeNode::new("Button", "", &log)),
    );

    const TABS: UiPath = UiPath::new(
        "tabs",
        &[PathStep::class("Pane"), PathStep::class("TabItem")],
    );
    assert_eq!(resolve_all(&window, &TABS).unwrap().len(), 2);

    const MENUS: UiPath = UiPath::new(
        "menus",
        &[PathStep::class("Pane"), PathStep::class("Menu")],
    );
    assert!(resolve_all(&window, &MENUS).unwrap().is_empty());
}

#[test]
fn descendant_search_respects_depth_bound() {
    let log = new_log();
    let deep = FakeNode::new("Window", "", &log).child(FakeNode::new("Pane", "", &log).child(
        FakeNode::new("Pane", "", &log).child(FakeNode::new("Text", "Video not found", &log)),
    ));

    assert!(has_descendant_titled(&deep, "Video not found", 3).unwrap());
    assert!(!has_descendant_titled(&deep, "Video not found", 2).unwrap());
}

#[test]
fn path_display_is_readable() {
    assert_eq!(
        TWO_DEEP.to_string(),
        "second text box (Pane[0]/TextBox[1])"
    );
    let step = PathStep::class("Expander").titled("Recorded Video");
    assert_eq!(step.to_string(), "Expander['Recorded Video'][0]");
}
