use crate::ui::core::tree::ViewId;

pub type Result<T> = std::result::Result<T, ViewError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// `set_state` accepts exactly one flag per call.
    MultipleStateBits(u16),
    UnknownView(ViewId),
    NotAGroup(ViewId),
    AlreadyOwned(ViewId),
    NotAMember { group: ViewId, view: ViewId },
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewError::MultipleStateBits(bits) => {
                write!(f, "set_state expects a single flag, got {bits:#06x}")
            }
            ViewError::UnknownView(id) => write!(f, "unknown view {id:?}"),
            ViewError::NotAGroup(id) => write!(f, "view {id:?} is not a group"),
            ViewError::AlreadyOwned(id) => write!(f, "view {id:?} already has an owner"),
            ViewError::NotAMember { group, view } => {
                write!(f, "view {view:?} is not a child of {group:?}")
            }
        }
    }
}

impl std::error::Error for ViewError {}
