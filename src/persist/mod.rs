//! Saving and restoring view trees.
//!
//! A tree is written as nested [`ViewRecord`]s: the shared node state plus a
//! class tag and whatever the widget chooses to save. References between
//! views (a group's current child, a window's frame) are stored as pre-order
//! indices into the saved subtree. Loading runs in two phases: every node is
//! constructed and linked first, then references are resolved.

use crate::core::error::ViewError;
use crate::ui::core::flags::{DragMode, EventMask, GrowMode, Options, StateFlags};
use crate::ui::core::geom::{Point, Rect};
use crate::ui::core::tree::{ViewId, ViewTree};
use crate::ui::core::widget::Widget;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Class tags of the built-in widgets.
pub mod tags {
    pub const VIEW: u16 = 1;
    pub const GROUP: u16 = 2;
    pub const FRAME: u16 = 10;
    pub const WINDOW: u16 = 11;
    pub const BACKGROUND: u16 = 20;
    pub const DESKTOP: u16 = 21;
    pub const MENU_VIEW: u16 = 30;
    pub const STATUS_LINE: u16 = 31;
    pub const PROGRAM: u16 = 40;
}

#[derive(Debug)]
pub enum PersistError {
    UnknownTag(u16),
    DuplicateTag(u16),
    /// A saved reference points outside the loaded subtree.
    BadIndex(u32),
    /// The widget of this view is in use and cannot be saved.
    Busy(ViewId),
    Data { tag: u16, source: serde_json::Error },
    Json(serde_json::Error),
    View(ViewError),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::UnknownTag(tag) => write!(f, "no constructor registered for tag {tag}"),
            PersistError::DuplicateTag(tag) => write!(f, "tag {tag} is already registered"),
            PersistError::BadIndex(index) => write!(f, "view reference {index} is out of range"),
            PersistError::Busy(id) => write!(f, "view {id:?} is busy"),
            PersistError::Data { tag, source } => write!(f, "bad data for tag {tag}: {source}"),
            PersistError::Json(e) => write!(f, "json: {e}"),
            PersistError::View(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Data { source, .. } => Some(source),
            PersistError::Json(e) => Some(e),
            PersistError::View(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ViewError> for PersistError {
    fn from(e: ViewError) -> Self {
        PersistError::View(e)
    }
}

/// Decode the widget data of `tag`.
pub fn decode<T: serde::de::DeserializeOwned>(tag: u16, data: &Value) -> Result<T, PersistError> {
    T::deserialize(data).map_err(|source| PersistError::Data { tag, source })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub tag: u16,
    pub bounds: Rect,
    pub state: StateFlags,
    pub options: Options,
    pub event_mask: EventMask,
    pub grow_mode: GrowMode,
    pub drag_mode: DragMode,
    #[serde(default)]
    pub help_ctx: u16,
    #[serde(default)]
    pub cursor: Point,
    #[serde(default)]
    pub min_size: Point,
    #[serde(default)]
    pub follows_selection: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    #[serde(default)]
    pub children: Vec<ViewRecord>,
}

pub type Constructor = fn(&Value) -> Result<Box<dyn Widget>, PersistError>;

/// Maps class tags to widget constructors.
#[derive(Default)]
pub struct Registry {
    constructors: FxHashMap<u16, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that knows every widget shipped with the crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (tag, constructor) in crate::ui::widgets::builtin_constructors() {
            // Builtin tags are distinct.
            let _ = registry.register(tag, constructor);
        }
        registry
    }

    pub fn register(&mut self, tag: u16, constructor: Constructor) -> Result<(), PersistError> {
        if self.constructors.contains_key(&tag) {
            return Err(PersistError::DuplicateTag(tag));
        }
        self.constructors.insert(tag, constructor);
        Ok(())
    }

    pub fn construct(&self, tag: u16, data: &Value) -> Result<Box<dyn Widget>, PersistError> {
        let constructor = self
            .constructors
            .get(&tag)
            .ok_or(PersistError::UnknownTag(tag))?;
        constructor(data)
    }
}

/// Pre-order indices of the subtree being saved.
pub struct SaveCx<'a> {
    indices: &'a FxHashMap<ViewId, u32>,
}

impl SaveCx<'_> {
    pub fn index_of(&self, id: ViewId) -> Option<u32> {
        self.indices.get(&id).copied()
    }
}

/// Live ids of the subtree being loaded, in pre-order.
pub struct LoadCx<'a> {
    ids: &'a [ViewId],
}

impl LoadCx<'_> {
    pub fn view(&self, index: u32) -> Result<ViewId, PersistError> {
        self.ids
            .get(index as usize)
            .copied()
            .ok_or(PersistError::BadIndex(index))
    }
}

fn pre_order(tree: &ViewTree, id: ViewId, out: &mut Vec<ViewId>) {
    out.push(id);
    for &child in tree.children(id) {
        pre_order(tree, child, out);
    }
}

/// Save `root` and everything below it.
pub fn save(tree: &ViewTree, root: ViewId) -> Result<ViewRecord, PersistError> {
    if !tree.contains(root) {
        return Err(PersistError::View(ViewError::UnknownView(root)));
    }
    let mut order = Vec::new();
    pre_order(tree, root, &mut order);
    let indices: FxHashMap<ViewId, u32> = order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as u32))
        .collect();
    let cx = SaveCx { indices: &indices };
    save_node(tree, root, &cx)
}

fn save_node(tree: &ViewTree, id: ViewId, cx: &SaveCx<'_>) -> Result<ViewRecord, PersistError> {
    let widget = tree.widget_dyn(id).ok_or(PersistError::Busy(id))?;
    let mut state = tree.state(id);
    state.set(StateFlags::EXPOSED, false);
    let group = if tree.is_group(id) {
        let children = tree
            .children(id)
            .iter()
            .map(|&child| save_node(tree, child, cx))
            .collect::<Result<Vec<_>, _>>()?;
        Some(GroupRecord {
            current: tree.current(id).and_then(|c| cx.index_of(c)),
            children,
        })
    } else {
        None
    };
    Ok(ViewRecord {
        tag: widget.class_tag(),
        bounds: tree.bounds(id),
        state,
        options: tree.options(id),
        event_mask: tree.event_mask(id),
        grow_mode: tree.grow_mode(id),
        drag_mode: tree.drag_mode(id),
        help_ctx: tree.own_help_ctx(id),
        cursor: tree.cursor(id),
        min_size: tree.min_size(id),
        follows_selection: tree.active_follows_selection(id),
        data: widget.save(cx),
        group,
    })
}

/// Rebuild a saved subtree. The result is detached; insert it into a group
/// (or make it the root) to show it.
pub fn load(tree: &mut ViewTree, registry: &Registry, record: &ViewRecord) -> Result<ViewId, PersistError> {
    let mut built: Vec<(ViewId, &ViewRecord)> = Vec::new();
    let result = build(tree, registry, record, None, &mut built).and_then(|root| {
        let ids: Vec<ViewId> = built.iter().map(|(id, _)| *id).collect();
        let cx = LoadCx { ids: &ids };
        for (id, rec) in &built {
            if let Some(current) = rec.group.as_ref().and_then(|g| g.current) {
                tree.restore_current(*id, Some(cx.view(current)?));
            }
            if let Some(resolved) = tree.with_widget(*id, |w, _| w.resolve(&rec.data, &cx)) {
                resolved?;
            }
        }
        Ok(root)
    });
    if result.is_err() {
        if let Some(&(root, _)) = built.first() {
            tree.destroy(root);
        }
    }
    let root = result?;
    tracing::debug!(?root, views = built.len(), "view tree loaded");
    Ok(root)
}

fn build<'r>(
    tree: &mut ViewTree,
    registry: &Registry,
    record: &'r ViewRecord,
    owner: Option<ViewId>,
    built: &mut Vec<(ViewId, &'r ViewRecord)>,
) -> Result<ViewId, PersistError> {
    let widget = registry.construct(record.tag, &record.data)?;
    let id = if record.group.is_some() {
        tree.create_group(record.bounds, widget)
    } else {
        tree.create(record.bounds, widget)
    };
    if let Some(owner) = owner {
        tree.attach_raw(owner, id);
    }
    built.push((id, record));
    tree.restore_state(id, record.state);
    tree.set_options(id, record.options);
    tree.set_event_mask(id, record.event_mask);
    tree.set_grow_mode(id, record.grow_mode);
    tree.set_drag_mode(id, record.drag_mode);
    tree.set_help_ctx(id, record.help_ctx);
    tree.set_cursor(id, record.cursor.x, record.cursor.y);
    tree.set_min_size(id, record.min_size);
    tree.set_active_follows_selection(id, record.follows_selection);
    if let Some(group) = &record.group {
        for child in &group.children {
            build(tree, registry, child, Some(id), built)?;
        }
    }
    Ok(id)
}

/// Save to a JSON string.
pub fn to_json(tree: &ViewTree, root: ViewId) -> Result<String, PersistError> {
    let record = save(tree, root)?;
    serde_json::to_string_pretty(&record).map_err(PersistError::Json)
}

/// Load from a JSON string produced by [`to_json`].
pub fn from_json(tree: &mut ViewTree, registry: &Registry, text: &str) -> Result<ViewId, PersistError> {
    let record: ViewRecord = serde_json::from_str(text).map_err(PersistError::Json)?;
    load(tree, registry, &record)
}

#[cfg(test)]
#[path = "../../tests/unit/persist/mod.rs"]
mod tests;
