//! The shared-formula relation
//!
//! A shared group is identified by its `si` key. Cells that carry both
//! formula text and the key are anchors; cells that carry only the key are
//! dependent members whose text is derived from the canonical anchor (the
//! first anchor in row-major order) plus their row/column offset.
//!
//! The index is kept as a map `SharedId -> SharedGroup` rather than as
//! links between cells, so re-rooting or dissolving a group is a single
//! map update.

use ahash::AHashMap;
use std::collections::BTreeSet;
use std::fmt;

/// Key of a shared-formula group (`si` in cell records)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SharedId(String);

impl SharedId {
    /// Create a shared id
    pub fn new(id: impl Into<String>) -> Self {
        SharedId(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SharedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SharedId {
    fn from(s: &str) -> Self {
        SharedId::new(s)
    }
}

impl From<String> for SharedId {
    fn from(s: String) -> Self {
        SharedId(s)
    }
}

/// Cells belonging to one shared group, as `(row, col)` positions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedGroup {
    anchors: BTreeSet<(u32, u16)>,
    members: BTreeSet<(u32, u16)>,
}

impl SharedGroup {
    /// The cell whose text defines the group, if any anchor exists
    pub fn canonical(&self) -> Option<(u32, u16)> {
        self.anchors.iter().next().copied()
    }

    /// Check whether the group has no cells left
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty() && self.members.is_empty()
    }
}

/// Index from group key to the cells of that group
#[derive(Debug, Clone, Default)]
pub struct SharedGroupIndex {
    groups: AHashMap<SharedId, SharedGroup>,
}

impl SharedGroupIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a group
    pub fn get(&self, id: &SharedId) -> Option<&SharedGroup> {
        self.groups.get(id)
    }

    /// Canonical cell of a group
    pub fn canonical(&self, id: &SharedId) -> Option<(u32, u16)> {
        self.groups.get(id).and_then(SharedGroup::canonical)
    }

    /// Number of groups with at least one cell
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no groups are registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over all groups (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&SharedId, &SharedGroup)> {
        self.groups.iter()
    }

    pub(crate) fn link(&mut self, id: &SharedId, row: u32, col: u16, anchor: bool) {
        let group = self.groups.entry(id.clone()).or_default();
        if anchor {
            group.anchors.insert((row, col));
        } else {
            group.members.insert((row, col));
        }
    }

    pub(crate) fn unlink(&mut self, id: &SharedId, row: u32, col: u16) {
        if let Some(group) = self.groups.get_mut(id) {
            group.anchors.remove(&(row, col));
            group.members.remove(&(row, col));
            if group.is_empty() {
                self.groups.remove(id);
            }
        }
    }
}
