//! Formula data store
//!
//! Sparse row-based storage of the formula cells of one worksheet,
//! `BTreeMap<row, BTreeMap<col, FormulaCell>>`, with the shared-group
//! index kept in step on every insert and remove.

use crate::cell::CachedValue;
use crate::shared::{SharedGroupIndex, SharedId};
use std::collections::BTreeMap;

/// Formula content of a single cell
///
/// A cell has formula text, a shared-group key, or both. A cell with only
/// the key is a dependent shared member.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCell {
    /// Literal formula text (`f`), normally starting with `=`
    pub text: Option<String>,
    /// Shared-group key (`si`)
    pub shared_id: Option<SharedId>,
    /// Last value written by an external evaluator (`v` / `t`)
    pub cached: Option<CachedValue>,
}

impl FormulaCell {
    /// A plain formula
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            shared_id: None,
            cached: None,
        }
    }

    /// A formula that anchors a shared group
    pub fn anchor(text: impl Into<String>, id: impl Into<SharedId>) -> Self {
        Self {
            text: Some(text.into()),
            shared_id: Some(id.into()),
            cached: None,
        }
    }

    /// A dependent member of a shared group
    pub fn member(id: impl Into<SharedId>) -> Self {
        Self {
            text: None,
            shared_id: Some(id.into()),
            cached: None,
        }
    }

    /// Attach a cached value
    pub fn with_cached(mut self, cached: CachedValue) -> Self {
        self.cached = Some(cached);
        self
    }

    /// Check if the cell's text is derived from its group's canonical cell
    pub fn is_dependent(&self) -> bool {
        self.text.is_none() && self.shared_id.is_some()
    }

    /// Check if the cell carries neither text nor a group key
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.shared_id.is_none()
    }
}

/// Sparse storage for formula cells
#[derive(Debug, Clone, Default)]
pub struct FormulaStore {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u16, FormulaCell>>,
    groups: SharedGroupIndex,
}

impl FormulaStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell
    pub fn get(&self, row: u32, col: u16) -> Option<&FormulaCell> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Store a cell, returning what it replaced
    ///
    /// An empty cell removes the position instead.
    pub fn insert(&mut self, row: u32, col: u16, cell: FormulaCell) -> Option<FormulaCell> {
        let previous = self.remove(row, col);
        if cell.is_empty() {
            return previous;
        }

        if let Some(id) = &cell.shared_id {
            self.groups.link(id, row, col, cell.text.is_some());
        }
        self.rows.entry(row).or_default().insert(col, cell);
        previous
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<FormulaCell> {
        let result = self.rows.get_mut(&row).and_then(|r| r.remove(&col));

        // Clean up empty rows
        if let Some(row_map) = self.rows.get(&row) {
            if row_map.is_empty() {
                self.rows.remove(&row);
            }
        }

        if let Some(id) = result.as_ref().and_then(|c| c.shared_id.as_ref()) {
            self.groups.unlink(id, row, col);
        }
        result
    }

    /// Replace the cached value of an existing cell
    ///
    /// Returns `false` when there is no cell at the position.
    pub fn set_cached(&mut self, row: u32, col: u16, cached: Option<CachedValue>) -> bool {
        match self.rows.get_mut(&row).and_then(|r| r.get_mut(&col)) {
            Some(cell) => {
                cell.cached = cached;
                true
            }
            None => false,
        }
    }

    /// Get the number of formula cells
    pub fn len(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &FormulaCell)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, cell)| (row, col, cell)))
    }

    /// The shared-group index
    pub fn groups(&self) -> &SharedGroupIndex {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_and_remove_track_groups() {
        let mut store = FormulaStore::new();
        store.insert(19, 1, FormulaCell::anchor("=SUM(A20)", "id1"));
        store.insert(20, 1, FormulaCell::member("id1"));
        store.insert(0, 6, FormulaCell::literal("=A1:B2"));

        let id = SharedId::new("id1");
        assert_eq!(store.len(), 3);
        assert_eq!(store.groups().canonical(&id), Some((19, 1)));

        let removed = store.remove(19, 1).unwrap();
        assert_eq!(removed.text.as_deref(), Some("=SUM(A20)"));
        assert_eq!(store.groups().canonical(&id), None);
        assert!(!store.groups().get(&id).unwrap().is_empty());
        store.remove(20, 1);
        assert!(store.groups().get(&id).is_none());
    }

    #[test]
    fn test_overwrite_relinks_group() {
        let mut store = FormulaStore::new();
        store.insert(1, 1, FormulaCell::member("a"));
        let previous = store.insert(1, 1, FormulaCell::anchor("=B1", "b"));

        assert_eq!(previous, Some(FormulaCell::member("a")));
        assert!(store.groups().get(&SharedId::new("a")).is_none());
        assert_eq!(store.groups().canonical(&SharedId::new("b")), Some((1, 1)));
    }

    #[test]
    fn test_empty_cell_clears_position() {
        let mut store = FormulaStore::new();
        store.insert(2, 2, FormulaCell::literal("=1"));
        store.insert(
            2,
            2,
            FormulaCell {
                text: None,
                shared_id: None,
                cached: None,
            },
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_cached() {
        let mut store = FormulaStore::new();
        store.insert(0, 0, FormulaCell::literal("=1+1"));
        assert!(store.set_cached(0, 0, Some(CachedValue::number(2.0))));
        assert!(!store.set_cached(5, 5, None));
        assert_eq!(store.get(0, 0).unwrap().cached, Some(CachedValue::number(2.0)));
    }
}
