use super::*;
use crate::ui::core::widget::{PlainGroup, PlainView};
use crate::ui::widgets::Window;

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    hits: u32,
}

const COUNTER: u16 = 500;

impl Widget for Counter {
    fn class_tag(&self) -> u16 {
        COUNTER
    }

    fn save(&self, _cx: &SaveCx<'_>) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn construct_group(_data: &Value) -> Result<Box<dyn Widget>, PersistError> {
    Ok(Box::new(PlainGroup))
}

fn construct_counter(data: &Value) -> Result<Box<dyn Widget>, PersistError> {
    let counter: Counter = decode(COUNTER, data)?;
    Ok(Box::new(counter))
}

/// A detached group holding a window, a counter and a plain leaf.
fn sample(tree: &mut ViewTree) -> ViewId {
    let group = tree.create_group(Rect::new(0, 0, 60, 20), Box::new(PlainGroup));
    tree.set_help_ctx(group, 9);
    let leaf = tree.create(Rect::new(0, 0, 3, 1), Box::new(PlainView));
    tree.insert(group, leaf).unwrap();
    let counter = tree.create(Rect::new(0, 1, 3, 2), Box::new(Counter { hits: 7 }));
    tree.set_grow_mode(counter, GrowMode::HI_X);
    tree.insert(group, counter).unwrap();
    let window = Window::create(tree, Rect::new(2, 2, 30, 12), "Notes", Some(3)).unwrap();
    tree.insert(group, window).unwrap();
    group
}

fn registry() -> Registry {
    let mut registry = Registry::with_builtins();
    registry.register(COUNTER, construct_counter).unwrap();
    registry
}

#[test]
fn saved_tree_loads_back_identically() {
    let mut tree = ViewTree::new();
    let group = sample(&mut tree);
    let record = save(&tree, group).unwrap();

    let mut fresh = ViewTree::new();
    let loaded = load(&mut fresh, &registry(), &record).unwrap();
    assert_eq!(fresh.len(), tree.len());
    assert_eq!(save(&fresh, loaded).unwrap(), record);
    assert_eq!(fresh.owner(loaded), None);
    assert_eq!(fresh.own_help_ctx(loaded), 9);

    let children = fresh.children(loaded).to_vec();
    assert_eq!(children.len(), 3);
    let window = children[0];
    assert_eq!(fresh.current(loaded), Some(window));
    let frame = fresh.widget::<Window>(window).and_then(Window::frame);
    assert_eq!(frame, fresh.children(window).first().copied());
    assert_eq!(fresh.widget::<Counter>(children[1]).map(|c| c.hits), Some(7));
    assert_eq!(fresh.grow_mode(children[1]), GrowMode::HI_X);
}

#[test]
fn json_round_trip_is_stable() {
    let mut tree = ViewTree::new();
    let group = sample(&mut tree);
    let text = to_json(&tree, group).unwrap();

    let mut fresh = ViewTree::new();
    let loaded = from_json(&mut fresh, &registry(), &text).unwrap();
    assert_eq!(to_json(&fresh, loaded).unwrap(), text);
}

#[test]
fn exposure_is_not_saved() {
    let mut tree = ViewTree::new();
    let root = tree.create_group(Rect::new(0, 0, 10, 5), Box::new(PlainGroup));
    tree.set_root(root).unwrap();
    let record = save(&tree, root).unwrap();
    assert!(!record.state.contains(StateFlags::EXPOSED));
    assert!(record.state.contains(StateFlags::VISIBLE));
}

#[test]
fn unknown_tag_leaves_no_partial_tree() {
    let mut tree = ViewTree::new();
    let group = sample(&mut tree);
    let record = save(&tree, group).unwrap();

    let mut only_groups = Registry::new();
    only_groups.register(tags::GROUP, construct_group).unwrap();
    let mut fresh = ViewTree::new();
    let err = load(&mut fresh, &only_groups, &record).unwrap_err();
    assert!(matches!(err, PersistError::UnknownTag(tags::WINDOW)));
    assert!(fresh.is_empty());
}

#[test]
fn registering_a_tag_twice_fails() {
    let mut registry = Registry::with_builtins();
    let err = registry.register(tags::VIEW, construct_counter).unwrap_err();
    assert!(matches!(err, PersistError::DuplicateTag(tags::VIEW)));
    assert!(registry.construct(tags::VIEW, &Value::Null).is_ok());
}

#[test]
fn out_of_range_reference_is_rejected() {
    let mut tree = ViewTree::new();
    let group = sample(&mut tree);
    let mut record = save(&tree, group).unwrap();
    if let Some(g) = record.group.as_mut() {
        g.current = Some(99);
    }

    let mut fresh = ViewTree::new();
    let err = load(&mut fresh, &registry(), &record).unwrap_err();
    assert!(matches!(err, PersistError::BadIndex(99)));
    assert!(fresh.is_empty());
}

#[test]
fn malformed_widget_data_names_the_tag() {
    let mut tree = ViewTree::new();
    let window = Window::create(&mut tree, Rect::new(0, 0, 20, 8), "W", None).unwrap();
    let mut record = save(&tree, window).unwrap();
    record.data = serde_json::json!({ "title": 5 });

    let err = load(&mut ViewTree::new(), &registry(), &record).unwrap_err();
    assert!(matches!(err, PersistError::Data { tag: tags::WINDOW, .. }));
}

#[test]
fn busy_widget_cannot_be_saved() {
    let mut tree = ViewTree::new();
    let v = tree.create(Rect::new(0, 0, 1, 1), Box::new(PlainView));
    let result = tree.with_widget(v, |_, tree| save(tree, v).map(|_| ()));
    assert!(matches!(result, Some(Err(PersistError::Busy(id))) if id == v));
}

#[test]
fn bad_json_is_reported() {
    let err = from_json(&mut ViewTree::new(), &registry(), "{ not json").unwrap_err();
    assert!(matches!(err, PersistError::Json(_)));
}
