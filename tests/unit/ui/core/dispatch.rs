use super::*;
use crate::core::command::{CM_OK, CM_QUIT, CM_ZOOM};
use crate::core::event::{KeyCode, Message};
use crate::ui::backend::test::ScriptedSource;
use crate::ui::core::widget::{Executor, PlainGroup, PlainView, Widget};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<(&'static str, Event)>>>;

#[derive(Debug)]
struct Recorder {
    name: &'static str,
    log: Log,
    consume: bool,
}

impl Widget for Recorder {
    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        self.log.borrow_mut().push((self.name, *ev));
        if self.consume {
            tree.clear_event(id, ev);
        } else {
            tree.default_handle_event(id, ev);
        }
    }

    fn class_tag(&self) -> u16 {
        1
    }
}

/// Ends the enclosing modal loop with the first command it sees.
#[derive(Debug)]
struct Closer {
    seen_top: Rc<RefCell<Option<ViewId>>>,
}

impl Widget for Closer {
    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        if let Some(command) = ev.as_command() {
            *self.seen_top.borrow_mut() = tree.top_view();
            tree.disable_command(CM_ZOOM);
            tree.end_modal(id, command);
            tree.clear_event(id, ev);
            return;
        }
        tree.default_handle_event(id, ev);
    }

    fn class_tag(&self) -> u16 {
        1
    }
}

#[derive(Debug)]
struct Assassin(Option<ViewId>);

impl Widget for Assassin {
    fn handle_event(&mut self, tree: &mut ViewTree, _id: ViewId, ev: &mut Event) {
        if matches!(ev, Event::Broadcast(_)) {
            if let Some(target) = self.0.take() {
                tree.destroy(target);
            }
        }
    }

    fn class_tag(&self) -> u16 {
        1
    }
}

fn answer(_tree: &mut ViewTree, _id: ViewId) -> u16 {
    42
}

#[derive(Debug)]
struct Scripted;

impl Widget for Scripted {
    fn executor(&self) -> Option<Executor> {
        Some(answer as Executor)
    }

    fn class_tag(&self) -> u16 {
        1
    }
}

fn screen() -> (ViewTree, ViewId) {
    let mut tree = ViewTree::new();
    let root = tree.create_group(Rect::new(0, 0, 20, 10), Box::new(PlainGroup));
    tree.set_root(root).unwrap();
    (tree, root)
}

fn recorder(log: &Log, name: &'static str, consume: bool) -> Box<dyn Widget> {
    Box::new(Recorder {
        name,
        log: log.clone(),
        consume,
    })
}

fn add(tree: &mut ViewTree, group: ViewId, bounds: Rect, widget: Box<dyn Widget>, options: Options) -> ViewId {
    let v = tree.create(bounds, widget);
    tree.set_options(v, options);
    tree.insert_before(group, v, None).unwrap();
    v
}

/// Forget what setup delivered (focus broadcasts from insertion).
fn settle(log: &Log) {
    log.borrow_mut().clear();
}

fn names(log: &Log) -> Vec<&'static str> {
    log.borrow().iter().map(|(name, _)| *name).collect()
}

#[test]
fn mouse_goes_to_front_view_under_pointer() {
    let (mut tree, root) = screen();
    let log = Log::default();
    add(&mut tree, root, Rect::new(0, 0, 5, 5), recorder(&log, "front", false), Options::NONE);
    add(&mut tree, root, Rect::new(3, 3, 10, 8), recorder(&log, "back", false), Options::NONE);

    tree.handle_event(root, &mut Event::Mouse(MouseEvent::down(4, 4)));
    tree.handle_event(root, &mut Event::Mouse(MouseEvent::down(8, 7)));
    tree.handle_event(root, &mut Event::Mouse(MouseEvent::down(15, 9)));
    assert_eq!(names(&log), vec!["front", "back"]);
}

#[test]
fn masked_out_events_are_not_delivered() {
    let (mut tree, root) = screen();
    let log = Log::default();
    add(&mut tree, root, Rect::new(0, 0, 5, 5), recorder(&log, "leaf", false), Options::NONE);

    tree.handle_event(root, &mut Event::Mouse(MouseEvent::up(1, 1)));
    tree.handle_event(root, &mut Event::Mouse(MouseEvent::drag(1, 1)));
    assert!(log.borrow().is_empty());
}

#[test]
fn focused_events_visit_pre_current_post() {
    let (mut tree, root) = screen();
    let log = Log::default();
    add(&mut tree, root, Rect::new(0, 0, 1, 1), recorder(&log, "post", false), Options::POST_PROCESS);
    add(&mut tree, root, Rect::new(1, 0, 2, 1), recorder(&log, "current", false), Options::SELECTABLE);
    add(&mut tree, root, Rect::new(2, 0, 3, 1), recorder(&log, "pre", false), Options::PRE_PROCESS);
    settle(&log);

    tree.handle_event(root, &mut Event::key(KeyCode::Enter));
    assert_eq!(names(&log), vec!["pre", "current", "post"]);
}

#[test]
fn consumed_event_stops_routing() {
    let (mut tree, root) = screen();
    let log = Log::default();
    add(&mut tree, root, Rect::new(0, 0, 1, 1), recorder(&log, "pre", true), Options::PRE_PROCESS);
    add(&mut tree, root, Rect::new(1, 0, 2, 1), recorder(&log, "current", false), Options::SELECTABLE);
    settle(&log);

    let mut ev = Event::command(CM_OK);
    tree.handle_event(root, &mut ev);
    assert!(ev.is_nothing());
    assert_eq!(names(&log), vec!["pre"]);
}

#[test]
fn broadcasts_reach_everyone_and_message_names_the_consumer() {
    let (mut tree, root) = screen();
    let log = Log::default();
    let deaf = add(&mut tree, root, Rect::new(0, 0, 1, 1), recorder(&log, "deaf", false), Options::NONE);
    tree.set_event_mask(deaf, EventMask::NONE);
    add(&mut tree, root, Rect::new(1, 0, 2, 1), recorder(&log, "quiet", false), Options::NONE);

    assert_eq!(tree.message(root, Event::broadcast(CM_OK, Info::None)), None);
    assert_eq!(names(&log), vec!["deaf", "quiet"]);

    let eater = add(&mut tree, root, Rect::new(2, 0, 3, 1), recorder(&log, "eater", true), Options::NONE);
    assert_eq!(tree.message(root, Event::broadcast(CM_OK, Info::None)), Some(eater));
}

#[test]
fn disabled_views_only_get_broadcasts() {
    let (mut tree, root) = screen();
    let log = Log::default();
    let v = add(&mut tree, root, Rect::new(0, 0, 5, 5), recorder(&log, "off", false), Options::SELECTABLE);
    tree.set_state(v, StateFlags::DISABLED, true).unwrap();
    settle(&log);

    tree.handle_event(root, &mut Event::Mouse(MouseEvent::down(1, 1)));
    tree.handle_event(root, &mut Event::key(KeyCode::Enter));
    assert!(log.borrow().is_empty());

    tree.message(root, Event::broadcast(CM_OK, Info::None));
    assert_eq!(names(&log), vec!["off"]);
}

#[test]
fn click_selects_and_is_consumed_unless_first_click() {
    let (mut tree, root) = screen();
    let a = add(&mut tree, root, Rect::new(0, 0, 5, 1), Box::new(PlainView), Options::SELECTABLE);
    let b = add(&mut tree, root, Rect::new(0, 1, 5, 2), Box::new(PlainView), Options::SELECTABLE);
    assert_eq!(tree.current(root), Some(a));

    let mut ev = Event::Mouse(MouseEvent::down(1, 1));
    tree.handle_event(root, &mut ev);
    assert_eq!(tree.current(root), Some(b));
    assert!(ev.is_nothing());

    tree.set_options(a, Options::SELECTABLE | Options::FIRST_CLICK);
    let mut ev = Event::Mouse(MouseEvent::down(1, 0));
    tree.handle_event(root, &mut ev);
    assert_eq!(tree.current(root), Some(a));
    assert!(!ev.is_nothing());
}

#[test]
fn broadcast_survives_views_destroyed_midway() {
    let (mut tree, root) = screen();
    let log = Log::default();
    let killer = add(&mut tree, root, Rect::new(0, 0, 1, 1), Box::new(Assassin(None)), Options::NONE);
    let victim = add(&mut tree, root, Rect::new(1, 0, 2, 1), recorder(&log, "victim", false), Options::NONE);
    add(&mut tree, root, Rect::new(2, 0, 3, 1), recorder(&log, "bystander", false), Options::NONE);
    if let Some(assassin) = tree.widget_mut::<Assassin>(killer) {
        assassin.0 = Some(victim);
    }

    tree.message(root, Event::broadcast(CM_OK, Info::None));
    assert!(!tree.contains(victim));
    assert_eq!(names(&log), vec!["bystander"]);
    assert_eq!(tree.children(root).len(), 2);
}

#[test]
fn get_event_reads_pending_then_queue_then_source() {
    let mut tree = ViewTree::new();
    tree.set_event_source(Box::new(ScriptedSource::new([Event::command(300)])));
    tree.post_event(Event::command(200));
    tree.put_event(Event::command(100));

    assert_eq!(tree.get_event().as_command(), Some(100));
    assert_eq!(tree.get_event().as_command(), Some(200));
    assert_eq!(tree.get_event().as_command(), Some(300));
    assert!(tree.get_event().is_nothing());
    assert!(tree.input_exhausted());
}

#[test]
fn disabled_commands_are_dropped() {
    let mut tree = ViewTree::new();
    tree.disable_command(CM_ZOOM);
    tree.post_event(Event::command(CM_ZOOM));
    tree.post_event(Event::command(CM_OK));
    assert!(tree.get_event().is_nothing());
    assert_eq!(tree.get_event().as_command(), Some(CM_OK));
}

#[test]
fn idle_announces_command_set_changes_once() {
    let log = Log::default();
    let mut tree = ViewTree::new();
    let root = tree.create_group(Rect::new(0, 0, 10, 5), recorder(&log, "root", false));
    tree.set_root(root).unwrap();

    tree.disable_command(CM_ZOOM);
    tree.get_event();
    tree.get_event();
    let seen: Vec<Message> = log.borrow().iter().filter_map(|(_, ev)| ev.as_broadcast().copied()).collect();
    assert_eq!(seen, vec![Message::new(CM_COMMAND_SET_CHANGED, Info::None)]);
}

#[test]
fn status_line_sees_keys_and_its_own_clicks_first() {
    let (mut tree, root) = screen();
    let log = Log::default();
    let status = add(&mut tree, root, Rect::new(0, 9, 20, 10), recorder(&log, "status", false), Options::NONE);
    tree.set_status_line(Some(status));

    tree.post_event(Event::key(KeyCode::F(10)));
    tree.post_event(Event::Mouse(MouseEvent::down(3, 9)));
    tree.post_event(Event::Mouse(MouseEvent::down(3, 2)));
    tree.post_event(Event::command(CM_OK));

    assert_eq!(tree.get_event(), Event::key(KeyCode::F(10)));
    assert!(tree.get_event().as_mouse().is_some());
    assert!(tree.get_event().as_mouse().is_some());
    assert_eq!(tree.get_event().as_command(), Some(CM_OK));
    assert_eq!(names(&log), vec!["status", "status"]);
}

#[test]
fn execute_ends_with_cancel_when_input_runs_out() {
    let (mut tree, root) = screen();
    assert_eq!(tree.execute(root), CM_CANCEL);

    tree.set_event_source(Box::new(ScriptedSource::new([Event::key(KeyCode::Enter)])));
    assert_eq!(tree.execute(root), CM_CANCEL);
}

#[test]
fn end_modal_stops_the_innermost_modal_loop() {
    let (mut tree, root) = screen();
    let seen = Rc::new(RefCell::new(None));
    let closer = Box::new(Closer { seen_top: seen.clone() });
    add(&mut tree, root, Rect::new(0, 0, 1, 1), closer, Options::SELECTABLE);
    let mut source = ScriptedSource::new([Event::command(CM_QUIT)]);
    source.push(Event::command(CM_OK));
    tree.set_event_source(Box::new(source));

    assert_eq!(tree.execute(root), CM_QUIT);
    assert_eq!(*seen.borrow(), Some(root));
}

#[test]
fn exec_view_restores_selection_options_and_commands() {
    let (mut tree, root) = screen();
    let a = add(&mut tree, root, Rect::new(0, 0, 1, 1), Box::new(PlainView), Options::SELECTABLE);
    let seen = Rc::new(RefCell::new(None));
    let dialog = tree.create_group(Rect::new(2, 2, 10, 6), Box::new(Closer { seen_top: seen.clone() }));
    let options = tree.options(dialog);
    tree.set_event_source(Box::new(ScriptedSource::new([Event::command(CM_OK)])));

    assert_eq!(tree.exec_view(root, dialog), CM_OK);
    assert_eq!(*seen.borrow(), Some(dialog));
    assert_eq!(tree.owner(dialog), None);
    assert_eq!(tree.options(dialog), options);
    assert!(!tree.state(dialog).contains(StateFlags::MODAL));
    assert_eq!(tree.current(root), Some(a));
    assert!(tree.state(a).contains(StateFlags::FOCUSED));
    assert_eq!(tree.top_view(), Some(root));
    assert!(tree.command_enabled(CM_ZOOM));
}

#[test]
fn exec_view_prefers_the_widget_executor() {
    let (mut tree, root) = screen();
    let v = tree.create_group(Rect::new(0, 0, 4, 4), Box::new(Scripted));
    tree.set_event_source(Box::new(ScriptedSource::new([Event::command(CM_OK)])));
    assert_eq!(tree.exec_view(root, v), 42);
    assert!(!tree.input_exhausted());
    assert_eq!(tree.owner(v), None);
}

#[test]
fn drag_view_moves_until_release() {
    let (mut tree, root) = screen();
    let v = add(&mut tree, root, Rect::new(2, 2, 6, 4), Box::new(PlainView), Options::NONE);
    tree.set_event_source(Box::new(ScriptedSource::new([
        Event::Mouse(MouseEvent::drag(5, 3)),
        Event::Mouse(MouseEvent::drag(8, 6)),
        Event::Mouse(MouseEvent::up(8, 6)),
        Event::Mouse(MouseEvent::drag(0, 0)),
    ])));

    let mut ev = Event::Mouse(MouseEvent::down(3, 2));
    let limits = tree.extent(root);
    tree.drag_view(v, &mut ev, DragMode::MOVE, limits, Point::new(1, 1), Point::new(20, 10));
    assert_eq!(tree.bounds(v), Rect::new(7, 6, 11, 8));
    assert!(!tree.state(v).contains(StateFlags::DRAGGING));
    assert!(!tree.input_exhausted());
}

#[test]
fn drag_view_grows_from_the_corner() {
    let (mut tree, root) = screen();
    let v = add(&mut tree, root, Rect::new(2, 2, 6, 4), Box::new(PlainView), Options::NONE);
    tree.set_event_source(Box::new(ScriptedSource::new([Event::Mouse(MouseEvent::drag(8, 6))])));

    let mut ev = Event::Mouse(MouseEvent::down(5, 3));
    let limits = tree.extent(root);
    tree.drag_view(v, &mut ev, DragMode::GROW, limits, Point::new(1, 1), Point::new(20, 10));
    assert_eq!(tree.bounds(v), Rect::new(2, 2, 9, 7));
}

#[test]
fn requested_drag_respects_the_view_limits() {
    let (mut tree, root) = screen();
    let v = add(&mut tree, root, Rect::new(2, 2, 6, 4), Box::new(PlainView), Options::NONE);
    tree.set_event_source(Box::new(ScriptedSource::new([
        Event::Mouse(MouseEvent::drag(3, -5)),
        Event::Mouse(MouseEvent::up(3, -5)),
    ])));
    tree.request_drag(v, MouseEvent::down(3, 2), DragMode::MOVE);
    assert_eq!(tree.origin(v), Point::new(2, 0));
}
