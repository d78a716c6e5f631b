use super::*;
use crate::core::event::{KeyCode, KeyModifiers};

const CM_NEW: u16 = 100;
const CM_OPEN: u16 = 101;
const CM_EXIT: u16 = 102;
const CM_UNDO: u16 = 103;

fn file_menu() -> Menu {
    Menu::new(vec![
        MenuItem::new("~N~ew", CM_NEW, Some(KeyEvent::plain(KeyCode::F(4))), 0),
        MenuItem::separator(),
        MenuItem::new("~O~pen", CM_OPEN, Some(KeyEvent::plain(KeyCode::F(3))), 0).with_param("F3"),
        MenuItem::new("E~x~it", CM_EXIT, Some(KeyEvent::alt('x')), 0).with_param("Alt-X"),
    ])
}

#[test]
fn default_is_first_real_item() {
    let menu = Menu::new(vec![MenuItem::separator(), MenuItem::new("~A~", 1, None, 0)]);
    assert_eq!(menu.default, Some(1));
    assert_eq!(Menu::new(vec![MenuItem::separator()]).default, None);
}

#[test]
fn step_skips_separators_and_wraps() {
    let menu = file_menu();
    assert_eq!(menu.step(Some(0), true), Some(2));
    assert_eq!(menu.step(Some(2), false), Some(0));
    assert_eq!(menu.step(Some(3), true), Some(0));
    assert_eq!(menu.step(Some(0), false), Some(3));
    assert_eq!(menu.step(None, true), Some(0));
    assert_eq!(menu.step(None, false), Some(3));

    assert_eq!(Menu::default().step(None, true), None);
    assert_eq!(Menu::new(vec![MenuItem::separator()]).step(Some(0), true), None);
}

#[test]
fn hot_letters_are_case_insensitive() {
    let mut menu = file_menu();
    assert_eq!(menu.find_hot('n'), Some(0));
    assert_eq!(menu.find_hot('X'), Some(3));
    assert_eq!(menu.find_hot('q'), None);

    menu.items[3].disabled = true;
    assert_eq!(menu.find_hot('x'), None);
}

#[test]
fn hot_keys_are_found_in_submenus() {
    let edit = Menu::new(vec![MenuItem::new("~U~ndo", CM_UNDO, Some(KeyEvent::alt('u')), 0).disabled()]);
    let bar = Menu::new(vec![
        MenuItem::submenu("~E~dit", 0, edit),
        MenuItem::submenu("~F~ile", 0, file_menu()),
    ]);

    assert_eq!(bar.hot_key(&KeyEvent::plain(KeyCode::F(3))), Some(CM_OPEN));
    assert_eq!(bar.hot_key(&KeyEvent::new(KeyCode::Char('X'), KeyModifiers::ALT)), None);
    assert_eq!(bar.hot_key(&KeyEvent::alt('x')), Some(CM_EXIT));
    // Disabled items never fire.
    assert_eq!(bar.hot_key(&KeyEvent::alt('u')), None);
}

#[test]
fn disabled_flags_follow_the_command_set() {
    let mut bar = Menu::new(vec![MenuItem::submenu("~F~ile", 0, file_menu())]);
    let mut commands = CommandSet::all();
    assert!(!bar.update_disabled(&commands));

    commands.disable(CM_OPEN);
    assert!(bar.update_disabled(&commands));
    let file = bar.items[0].submenu.as_ref().unwrap();
    assert!(file.items[2].disabled);
    assert!(!file.items[0].disabled);
    assert!(!bar.update_disabled(&commands));

    commands.enable(CM_OPEN);
    assert!(bar.update_disabled(&commands));
}

#[test]
fn box_width_fits_labels_and_params() {
    // "Exit" + "Alt-X": 4 + 6 + 5 + 2.
    assert_eq!(file_menu().box_width(), 17);
    let bar = Menu::new(vec![MenuItem::submenu("~F~ile", 0, file_menu())]);
    assert_eq!(bar.box_width(), 13);
    assert_eq!(Menu::default().box_width(), 10);
}

#[test]
fn menus_serialize_with_their_defaults() {
    let mut menu = file_menu();
    menu.default = Some(3);
    let text = serde_json::to_string(&menu).unwrap();
    let back: Menu = serde_json::from_str(&text).unwrap();
    assert_eq!(back, menu);
}
