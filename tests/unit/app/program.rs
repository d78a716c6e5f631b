use super::*;
use crate::core::command::{CM_OK, FIRST_USER};
use crate::core::event::{KeyCode, KeyEvent};
use crate::ui::backend::test::{ScriptedSource, TestBackend};
use crate::ui::core::flags::Options;
use crate::ui::core::widget::PlainGroup;
use crate::ui::widgets::{MenuItem, StatusItem, Window};

const CM_OPEN_WINDOW: u16 = FIRST_USER + 1;

fn program() -> Program {
    let menu = Menu::new(vec![MenuItem::new("E~x~it", CM_QUIT, Some(KeyEvent::alt('x')), 0)]);
    let status = vec![StatusDef::new(
        0,
        u16::MAX,
        vec![StatusItem::new("~Alt-X~ Exit", Some(KeyEvent::alt('x')), CM_QUIT)],
    )];
    Program::new(Point::new(40, 12), &ProgramConfig::default(), menu, status).unwrap()
}

fn window(p: &mut Program, number: u8) -> ViewId {
    let bounds = Rect::new(i16::from(number), 1, i16::from(number) + 20, 9);
    let w = Window::create(p.tree_mut(), bounds, "W", Some(number)).unwrap();
    p.insert_window(w).unwrap()
}

fn open_on_request(tree: &mut ViewTree, program: &ProgramView, message: &Message) -> bool {
    if message.command != CM_OPEN_WINDOW {
        return false;
    }
    let Some(desktop) = program.desktop() else {
        return false;
    };
    let Ok(w) = Window::create(tree, Rect::new(0, 0, 20, 8), "Opened", None) else {
        return false;
    };
    tree.insert(desktop, w).is_ok()
}

/// Refuses to be created.
#[derive(Debug)]
struct Broken;

impl Widget for Broken {
    fn valid(&mut self, command: u16) -> bool {
        command != CM_VALID
    }

    fn class_tag(&self) -> u16 {
        tags::VIEW
    }
}

/// Ends the modal loop it runs in on Enter.
#[derive(Debug)]
struct OkButton;

impl Widget for OkButton {
    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        if ev.as_key().is_some_and(|k| k.code == KeyCode::Enter) {
            tree.end_modal(id, CM_OK);
            tree.clear_event(id, ev);
        }
    }

    fn class_tag(&self) -> u16 {
        tags::VIEW
    }
}

#[test]
fn standard_parts_are_laid_out() {
    let p = program();
    let tree = p.tree();
    let (menu, desktop, status) = (p.menu_bar().unwrap(), p.desktop().unwrap(), p.status_line().unwrap());

    assert_eq!(tree.bounds(menu), Rect::new(0, 0, 40, 1));
    assert_eq!(tree.bounds(desktop), Rect::new(0, 1, 40, 11));
    assert_eq!(tree.bounds(status), Rect::new(0, 11, 40, 12));
    assert_eq!(tree.children(p.root()), &[menu, status, desktop]);
    assert_eq!(tree.current(p.root()), Some(desktop));
    assert_eq!(tree.status_line(), Some(status));
    assert_eq!(tree.root(), Some(p.root()));
}

#[test]
fn alt_digit_picks_a_window() {
    let mut p = program();
    let one = window(&mut p, 1);
    let two = window(&mut p, 2);
    let desktop = p.desktop().unwrap();
    let root = p.root();
    assert_eq!(p.tree().current(desktop), Some(two));

    let consumer = p.tree_mut().message(root, Event::KeyDown(KeyEvent::alt('1')));
    assert_eq!(consumer, Some(root));
    assert_eq!(p.tree().current(desktop), Some(one));

    let consumer = p.tree_mut().message(root, Event::KeyDown(KeyEvent::alt('9')));
    assert_eq!(consumer, None);
}

#[test]
fn alt_x_quits_the_run() {
    let mut p = program();
    p.set_io(
        Box::new(TestBackend::new(40, 12)),
        Box::new(ScriptedSource::new([Event::KeyDown(KeyEvent::alt('x'))])),
    );
    assert_eq!(p.run(), CM_QUIT);
}

#[test]
fn run_ends_when_input_runs_dry() {
    let mut p = program();
    p.set_io(Box::new(TestBackend::new(40, 12)), Box::new(ScriptedSource::default()));
    assert_eq!(p.run(), CM_CANCEL);
}

#[test]
fn unhandled_commands_reach_the_hook() {
    let mut p = program();
    p.on_command(open_on_request);
    p.set_io(Box::new(TestBackend::new(40, 12)), Box::new(ScriptedSource::default()));
    p.tree_mut().post_event(Event::command(CM_OPEN_WINDOW));
    p.tree_mut().post_event(Event::command(CM_OPEN_WINDOW + 1));

    assert_eq!(p.run(), CM_CANCEL);
    let desktop = p.desktop().unwrap();
    let windows: Vec<&str> = p
        .tree()
        .children(desktop)
        .iter()
        .filter_map(|&c| p.tree().widget::<Window>(c))
        .map(Window::title)
        .collect();
    assert_eq!(windows, vec!["Opened"]);
}

#[test]
fn screen_resize_stretches_the_parts() {
    let mut p = program();
    p.set_io(Box::new(TestBackend::new(40, 12)), Box::new(ScriptedSource::default()));
    p.resize(Point::new(50, 15));

    let tree = p.tree();
    assert_eq!(tree.size(p.root()), Point::new(50, 15));
    assert_eq!(tree.bounds(p.menu_bar().unwrap()), Rect::new(0, 0, 50, 1));
    assert_eq!(tree.bounds(p.desktop().unwrap()), Rect::new(0, 1, 50, 14));
    assert_eq!(tree.bounds(p.status_line().unwrap()), Rect::new(0, 14, 50, 15));
    assert_eq!(tree.backend_as::<TestBackend>().map(TestBackend::size), Some((50, 15)));
}

#[test]
fn resize_command_is_handled_by_the_root() {
    let mut p = program();
    let root = p.root();
    let resized = Event::Command(Message::new(CM_SCREEN_RESIZED, Info::size(60, 20)));
    assert_eq!(p.tree_mut().message(root, resized), Some(root));
    assert_eq!(p.tree().size(root), Point::new(60, 20));
    assert_eq!(p.tree().bounds(p.status_line().unwrap()), Rect::new(0, 19, 60, 20));
}

#[test]
fn refused_windows_are_destroyed() {
    let mut p = program();
    let w = Window::create(p.tree_mut(), Rect::new(0, 0, 20, 8), "Broken", None).unwrap();
    let inner = p.tree_mut().create(Rect::new(1, 1, 4, 2), Box::new(Broken));
    p.tree_mut().insert(w, inner).unwrap();

    assert_eq!(p.insert_window(w), None);
    assert!(!p.tree().contains(w));
    assert!(!p.tree().contains(inner));
}

#[test]
fn dialogs_run_modally_and_are_destroyed() {
    let mut p = program();
    let before = window(&mut p, 1);
    p.set_io(
        Box::new(TestBackend::new(40, 12)),
        Box::new(ScriptedSource::new([Event::key(KeyCode::Enter)])),
    );

    let dialog = Window::create(p.tree_mut(), Rect::new(5, 2, 30, 9), "Confirm", None).unwrap();
    let ok = p.tree_mut().create(Rect::new(2, 3, 10, 4), Box::new(OkButton));
    p.tree_mut().set_options(ok, Options::SELECTABLE);
    p.tree_mut().insert(dialog, ok).unwrap();

    assert_eq!(p.exec_dialog(dialog), CM_OK);
    assert!(!p.tree().contains(dialog));
    assert_eq!(p.tree().current(p.desktop().unwrap()), Some(before));
}

#[test]
fn dialog_without_input_is_cancelled() {
    let mut p = program();
    p.set_io(Box::new(TestBackend::new(40, 12)), Box::new(ScriptedSource::default()));
    let dialog = Window::create(p.tree_mut(), Rect::new(5, 2, 30, 9), "Confirm", None).unwrap();
    assert_eq!(p.exec_dialog(dialog), CM_CANCEL);
    assert!(!p.tree().contains(dialog));
}

#[test]
fn saved_program_restores_its_parts() {
    let mut p = program();
    window(&mut p, 3);
    let text = p.save().unwrap();

    let restored = Program::restore(&text, &Registry::with_builtins()).unwrap();
    let tree = restored.tree();
    let desktop = restored.desktop().unwrap();
    assert_eq!(tree.status_line(), restored.status_line());
    assert!(tree.widget::<MenuView>(restored.menu_bar().unwrap()).is_some());

    let current = tree.current(desktop).unwrap();
    assert_eq!(tree.widget::<Window>(current).and_then(Window::number), Some(3));
    assert_eq!(tree.bounds(current), Rect::new(3, 1, 23, 9));
}

#[test]
fn restore_rejects_a_tree_that_is_not_a_program() {
    let mut tree = ViewTree::new();
    let group = tree.create_group(Rect::new(0, 0, 10, 5), Box::new(PlainGroup));
    let text = persist::to_json(&tree, group).unwrap();

    let err = Program::restore(&text, &Registry::with_builtins()).err();
    assert!(matches!(err, Some(PersistError::View(_))));
}
