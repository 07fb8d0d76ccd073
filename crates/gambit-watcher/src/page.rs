//! The host page as seen by the watcher.
//!
//! [`BoardPage`] is the only way the watcher touches the page. A browser
//! binding implements it over the live document; tests implement it over
//! plain data.

/// Outcome of calling an accessor on a host-page global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// The global has no such accessor.
    Missing,
    /// The accessor returned a value.
    Value(String),
    /// The accessor threw.
    Threw(String),
}

/// Read-only access to the page hosting the board.
pub trait BoardPage: Send + Sync {
    /// Whether the board element has been rendered yet.
    fn board_present(&self) -> bool;

    /// The board component's `fen` attribute, if set.
    fn fen_attribute(&self) -> Option<String>;

    /// Whether `window[name]` is defined.
    fn has_global(&self, name: &str) -> bool;

    /// Call `window[global][accessor]()`.
    fn call_accessor(&self, global: &str, accessor: &str) -> HostCall;

    /// The `class` attribute of every piece element on the board.
    fn piece_classes(&self) -> Vec<String>;
}

/// One record delivered by the page's mutation observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were added or removed somewhere in the board subtree.
    ChildList,
    /// An attribute changed.
    Attribute(String),
    /// Text content changed.
    CharacterData,
}

/// Attributes whose changes can move a piece.
pub const OBSERVED_ATTRIBUTES: [&str; 2] = ["class", "style"];

impl MutationRecord {
    /// Whether this record can reflect a change in board occupancy.
    pub fn is_relevant(&self) -> bool {
        match self {
            Self::ChildList => true,
            Self::Attribute(name) => OBSERVED_ATTRIBUTES.contains(&name.as_str()),
            Self::CharacterData => false,
        }
    }
}
