use super::*;

#[test]
fn set_toggles_only_requested_bits() {
    let mut state = StateFlags::VISIBLE | StateFlags::SELECTED;
    state.set(StateFlags::FOCUSED, true);
    assert!(state.contains(StateFlags::VISIBLE | StateFlags::FOCUSED));

    state.set(StateFlags::SELECTED, false);
    assert!(!state.intersects(StateFlags::SELECTED));
    assert!(state.contains(StateFlags::VISIBLE));
}

#[test]
fn grouped_event_masks_cover_members() {
    assert!(EventMask::MOUSE.contains(EventMask::MOUSE_DOWN | EventMask::MOUSE_AUTO));
    assert!(EventMask::FOCUSED.contains(EventMask::KEY_DOWN | EventMask::COMMAND));
    assert!(!EventMask::FOCUSED.intersects(EventMask::BROADCAST));
}
