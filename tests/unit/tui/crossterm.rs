use super::*;
use crossterm::event as ct;

fn press(x: u16, y: u16) -> ct::Event {
    ct::Event::Mouse(ct::MouseEvent {
        kind: ct::MouseEventKind::Down(ct::MouseButton::Left),
        column: x,
        row: y,
        modifiers: ct::KeyModifiers::NONE,
    })
}

#[test]
fn ctrl_space_normalizes_from_null() {
    let event = ct::KeyEvent::new(ct::KeyCode::Null, ct::KeyModifiers::NONE);
    let converted = into_key_event(event).unwrap();
    assert_eq!(converted.code, KeyCode::Char(' '));
    assert!(converted.modifiers.contains(KeyModifiers::CONTROL));
}

#[test]
fn key_releases_are_dropped() {
    let mut event = ct::KeyEvent::new(ct::KeyCode::Char('a'), ct::KeyModifiers::ALT);
    assert_eq!(into_key_event(event), Some(KeyEvent::alt('a')));
    event.kind = ct::KeyEventKind::Release;
    assert_eq!(into_key_event(event), None);
}

#[test]
fn drags_become_moves_and_wheel_is_ignored() {
    let drag = ct::MouseEvent {
        kind: ct::MouseEventKind::Drag(ct::MouseButton::Left),
        column: 4,
        row: 2,
        modifiers: ct::KeyModifiers::NONE,
    };
    let converted = into_mouse_event(drag).unwrap();
    assert_eq!(converted.kind, MouseKind::Move);
    assert_eq!(converted.pos, Point::new(4, 2));
    assert!(converted.buttons.contains(MouseButtons::LEFT));

    let wheel = ct::MouseEvent {
        kind: ct::MouseEventKind::ScrollDown,
        ..drag
    };
    assert_eq!(into_mouse_event(wheel), None);
}

#[test]
fn second_press_in_place_is_a_double_click() {
    let mut t = Translator::new(Duration::from_millis(300));
    let start = Instant::now();

    let first = t.translate(press(3, 3), start).unwrap();
    assert!(!first.as_mouse().unwrap().double);
    let second = t
        .translate(press(3, 3), start + Duration::from_millis(100))
        .unwrap();
    assert!(second.as_mouse().unwrap().double);
    // A third press starts a new pair.
    let third = t
        .translate(press(3, 3), start + Duration::from_millis(150))
        .unwrap();
    assert!(!third.as_mouse().unwrap().double);
}

#[test]
fn slow_or_moved_press_is_single() {
    let mut t = Translator::new(Duration::from_millis(300));
    let start = Instant::now();
    t.translate(press(3, 3), start);
    let late = t
        .translate(press(3, 3), start + Duration::from_millis(400))
        .unwrap();
    assert!(!late.as_mouse().unwrap().double);
    let moved = t
        .translate(press(4, 3), start + Duration::from_millis(450))
        .unwrap();
    assert!(!moved.as_mouse().unwrap().double);
}

#[test]
fn resize_is_delivered_as_a_command() {
    let mut t = Translator::new(Duration::from_millis(300));
    let ev = t.translate(ct::Event::Resize(100, 40), Instant::now()).unwrap();
    let Event::Command(message) = ev else {
        panic!("expected a command, got {ev:?}");
    };
    assert_eq!(message.command, CM_SCREEN_RESIZED);
    assert_eq!(message.info.as_size(), Some(Point::new(100, 40)));
}

#[test]
fn focus_events_produce_nothing() {
    let mut t = Translator::new(Duration::from_millis(300));
    assert_eq!(t.translate(ct::Event::FocusGained, Instant::now()), None);
}
