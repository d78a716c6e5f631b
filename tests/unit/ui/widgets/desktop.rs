use super::*;
use crate::ui::core::widget::PlainGroup;
use crate::ui::widgets::Window;

fn screen() -> (ViewTree, ViewId, ViewId) {
    let mut tree = ViewTree::new();
    let root = tree.create_group(Rect::new(0, 0, 30, 10), Box::new(PlainGroup));
    tree.set_root(root).unwrap();
    let desktop = Desktop::create(&mut tree, Rect::new(0, 1, 30, 9), '░').unwrap();
    tree.insert(root, desktop).unwrap();
    (tree, root, desktop)
}

fn windows(tree: &mut ViewTree, desktop: ViewId) -> [ViewId; 3] {
    let mut out = [ViewId::default(); 3];
    for (i, slot) in out.iter_mut().enumerate() {
        let at = i as i16 * 2;
        let w = Window::create(tree, Rect::new(at, at, at + 16, at + 6), "W", None).unwrap();
        tree.insert(desktop, w).unwrap();
        *slot = w;
    }
    out
}

#[test]
fn background_fills_the_desktop() {
    let (tree, root, desktop) = screen();
    let background = tree.widget::<Desktop>(desktop).and_then(Desktop::background).unwrap();
    assert_eq!(tree.bounds(background), Rect::new(0, 0, 30, 8));
    assert_eq!(tree.widget::<Background>(background).map(Background::pattern), Some('░'));

    let cells = tree.buffer(root).unwrap();
    assert!(cells[30..30 * 9].iter().all(|c| c.ch == '░'));
    assert!(cells[..30].iter().all(|c| c.ch != '░'));
}

#[test]
fn background_follows_desktop_size() {
    let (mut tree, _root, desktop) = screen();
    let background = tree.widget::<Desktop>(desktop).and_then(Desktop::background).unwrap();
    tree.grow_to(desktop, 20, 5);
    assert_eq!(tree.bounds(background), Rect::new(0, 0, 20, 5));
}

#[test]
fn next_brings_the_back_window_forward() {
    let (mut tree, _root, desktop) = screen();
    let [a, b, c] = windows(&mut tree, desktop);
    assert_eq!(tree.current(desktop), Some(c));

    let consumer = tree.message(desktop, Event::command(CM_NEXT));
    assert_eq!(consumer, Some(desktop));
    assert_eq!(tree.current(desktop), Some(a));
    assert_eq!(&tree.children(desktop)[..3], &[a, c, b]);

    tree.message(desktop, Event::command(CM_NEXT));
    assert_eq!(tree.current(desktop), Some(b));
}

#[test]
fn prev_sends_the_current_window_to_the_back() {
    let (mut tree, _root, desktop) = screen();
    let [a, b, c] = windows(&mut tree, desktop);
    let background = tree.widget::<Desktop>(desktop).and_then(Desktop::background);

    tree.message(desktop, Event::command(CM_PREV));
    assert_eq!(tree.children(desktop), &[b, a, c, background.unwrap()]);
    assert_eq!(tree.current(desktop), Some(b));
}
