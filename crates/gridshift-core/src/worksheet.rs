//! Worksheet type

use std::fmt;

use crate::cell::{CachedValue, CellAddress};
use crate::error::{Error, Result};
use crate::shared::SharedId;
use crate::store::{FormulaCell, FormulaStore};
use crate::{MAX_COLS, MAX_ROWS};

/// Stable sheet identifier, independent of the display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SheetId(String);

impl SheetId {
    /// Create a sheet id
    pub fn new(id: impl Into<String>) -> Self {
        SheetId(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SheetId {
    fn from(s: &str) -> Self {
        SheetId::new(s)
    }
}

/// A worksheet (single sheet in a workbook)
///
/// Only formula cells are held here; plain values belong to whatever
/// grid model hosts the sheet.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Stable id
    id: SheetId,
    /// Display name, used by sheet-qualified references
    name: String,
    /// Formula cells
    formulas: FormulaStore,
}

impl Worksheet {
    /// Create a new worksheet with the given id and name
    pub fn new(id: impl Into<SheetId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            formulas: FormulaStore::new(),
        }
    }

    /// Get the sheet id
    pub fn id(&self) -> &SheetId {
        &self.id
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Read access to the formula store
    pub fn formulas(&self) -> &FormulaStore {
        &self.formulas
    }

    // === Formula Access ===

    /// Get the formula cell by address string (e.g., "A1")
    pub fn formula(&self, address: &str) -> Result<Option<&FormulaCell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.formula_at(addr.row, addr.col))
    }

    /// Get the formula cell by row and column indices
    pub fn formula_at(&self, row: u32, col: u16) -> Option<&FormulaCell> {
        self.formulas.get(row, col)
    }

    /// Set a plain formula by address string
    pub fn set_formula(&mut self, address: &str, text: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_formula_at(addr.row, addr.col, text)
    }

    /// Set a plain formula by row and column indices
    pub fn set_formula_at(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.put(row, col, FormulaCell::literal(text))
    }

    /// Set formula text that anchors the shared group `id`
    pub fn set_shared_formula_at(&mut self, row: u32, col: u16, text: &str, id: &str) -> Result<()> {
        self.put(row, col, FormulaCell::anchor(text, id))
    }

    /// Make a cell a dependent member of the shared group `id`
    pub fn set_shared_member_at(&mut self, row: u32, col: u16, id: &str) -> Result<()> {
        self.put(row, col, FormulaCell::member(SharedId::new(id)))
    }

    /// Store a cached value for an existing formula cell
    pub fn set_cached_value_at(&mut self, row: u32, col: u16, cached: CachedValue) -> Result<()> {
        if self.formulas.set_cached(row, col, Some(cached)) {
            Ok(())
        } else {
            Err(Error::NotAFormula(
                CellAddress::new(row, col).to_a1_string(),
            ))
        }
    }

    /// Store a fully specified cell
    pub fn put(&mut self, row: u32, col: u16, cell: FormulaCell) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.formulas.insert(row, col, cell);
        Ok(())
    }

    /// Clear a cell, returning its previous content
    pub fn clear_cell_at(&mut self, row: u32, col: u16) -> Option<FormulaCell> {
        self.formulas.remove(row, col)
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }

    /// Get the number of formula cells
    pub fn formula_count(&self) -> usize {
        self.formulas.len()
    }

    /// Check if the worksheet holds no formulas
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}
