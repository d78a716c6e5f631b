use super::*;
use crate::core::command::{CM_MENU, CM_QUIT};
use crate::core::event::{KeyCode, MouseEvent};
use crate::ui::backend::test::ScriptedSource;
use crate::ui::core::widget::PlainGroup;

const CM_HELP: u16 = 120;

fn defs() -> Vec<StatusDef> {
    vec![
        StatusDef::new(
            0,
            99,
            vec![
                StatusItem::new("~Alt-X~ Exit", Some(KeyEvent::alt('x')), CM_QUIT),
                StatusItem::new("", Some(KeyEvent::plain(KeyCode::F(9))), CM_MENU),
                StatusItem::new("~F10~ Menu", Some(KeyEvent::plain(KeyCode::F(10))), CM_MENU),
            ],
        ),
        StatusDef::new(100, 199, vec![StatusItem::new("~F1~ Help", Some(KeyEvent::plain(KeyCode::F(1))), CM_HELP)]),
    ]
}

fn screen(events: Vec<Event>) -> (ViewTree, ViewId, ViewId) {
    let mut tree = ViewTree::new();
    let root = tree.create_group(Rect::new(0, 0, 40, 5), Box::new(PlainGroup));
    tree.set_root(root).unwrap();
    let status = StatusLine::create(&mut tree, Rect::new(0, 4, 40, 5), defs());
    tree.insert(root, status).unwrap();
    tree.set_status_line(Some(status));
    tree.set_event_source(Box::new(ScriptedSource::new(events)));
    (tree, root, status)
}

fn row(tree: &ViewTree, root: ViewId, y: usize) -> String {
    let width = tree.size(root).x as usize;
    tree.buffer(root).unwrap()[y * width..(y + 1) * width]
        .iter()
        .map(|c| c.ch)
        .collect()
}

#[test]
fn definitions_follow_the_help_context() {
    let mut line = StatusLine::from_defs(defs(), FxHashMap::default());
    assert_eq!(line.items().len(), 3);

    assert!(line.update(150));
    assert!(!line.update(150));
    assert_eq!(line.items()[0].command, CM_HELP);

    assert!(line.update(500));
    assert!(line.items().is_empty());
}

#[test]
fn hidden_items_take_no_space() {
    let line = StatusLine::from_defs(defs(), FxHashMap::default());
    assert_eq!(line.item_at(Point::new(0, 0)), Some(0));
    assert_eq!(line.item_at(Point::new(11, 0)), Some(0));
    assert_eq!(line.item_at(Point::new(12, 0)), Some(2));
    assert_eq!(line.item_at(Point::new(21, 0)), Some(2));
    assert_eq!(line.item_at(Point::new(22, 0)), None);
    assert_eq!(line.item_at(Point::new(3, 1)), None);
}

#[test]
fn bound_keys_become_commands() {
    let (mut tree, _root, _status) = screen(vec![
        Event::KeyDown(KeyEvent::alt('x')),
        Event::key(KeyCode::F(9)),
        Event::key(KeyCode::F(1)),
    ]);
    assert_eq!(tree.get_event().as_command(), Some(CM_QUIT));
    assert_eq!(tree.get_event().as_command(), Some(CM_MENU));
    // F1 belongs to another context.
    assert_eq!(tree.get_event(), Event::key(KeyCode::F(1)));
}

#[test]
fn disabled_commands_leave_keys_alone() {
    let (mut tree, _root, _status) = screen(vec![Event::KeyDown(KeyEvent::alt('x'))]);
    tree.disable_command(CM_QUIT);
    assert_eq!(tree.get_event(), Event::KeyDown(KeyEvent::alt('x')));
}

#[test]
fn click_on_an_item_posts_its_command() {
    let (mut tree, _root, _status) = screen(vec![
        Event::Mouse(MouseEvent::down(3, 4)),
        Event::Mouse(MouseEvent::drag(14, 4)),
        Event::Mouse(MouseEvent::up(14, 4)),
    ]);
    // The click itself is consumed by the status line.
    assert!(tree.get_event().is_nothing());
    assert_eq!(tree.get_event().as_command(), Some(CM_MENU));
}

#[test]
fn releasing_outside_the_items_does_nothing() {
    let (mut tree, _root, _status) = screen(vec![
        Event::Mouse(MouseEvent::down(3, 4)),
        Event::Mouse(MouseEvent::drag(30, 4)),
        Event::Mouse(MouseEvent::up(30, 4)),
    ]);
    assert!(tree.get_event().is_nothing());
    assert!(tree.get_event().is_nothing());
    assert!(tree.input_exhausted());
}

#[test]
fn release_position_decides_the_item() {
    let (mut tree, _root, _status) = screen(vec![
        Event::Mouse(MouseEvent::down(3, 4)),
        Event::Mouse(MouseEvent::up(14, 4)),
    ]);
    assert!(tree.get_event().is_nothing());
    assert_eq!(tree.get_event().as_command(), Some(CM_MENU));
}

#[test]
fn press_on_an_item_then_release_elsewhere_posts_nothing() {
    let (mut tree, _root, _status) = screen(vec![
        Event::Mouse(MouseEvent::down(3, 4)),
        Event::Mouse(MouseEvent::up(30, 4)),
    ]);
    assert!(tree.get_event().is_nothing());
    assert!(tree.get_event().is_nothing());
    assert!(tree.input_exhausted());
}

#[test]
fn idle_tracks_the_top_view_context() {
    let (mut tree, root, status) = screen(Vec::new());
    tree.set_help_ctx(root, 150);
    tree.get_event();
    assert_eq!(tree.widget::<StatusLine>(status).map(StatusLine::help_ctx), Some(150));
    assert!(row(&tree, root, 4).starts_with(" F1 Help "));
}

#[test]
fn draws_items_and_the_hint() {
    let (mut tree, root, status) = screen(Vec::new());
    assert!(row(&tree, root, 4).starts_with(" Alt-X Exit  F10 Menu  "));

    if let Some(line) = tree.widget_mut::<StatusLine>(status) {
        line.set_hint(0, "ready");
    }
    tree.draw_view(status);
    assert!(row(&tree, root, 4).starts_with(" Alt-X Exit  F10 Menu │ ready"));
}
