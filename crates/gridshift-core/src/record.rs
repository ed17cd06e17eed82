//! Persisted cell records
//!
//! The flat `f` / `si` / `v` / `t` shape cells are stored in, grouped per
//! sheet as `row -> col -> record`. With the `serde` feature these map
//! one-to-one onto JSON:
//!
//! ```json
//! { "sheets": [ { "id": "sheet1", "name": "Sheet1",
//!     "cells": { "19": { "1": { "f": "=SUM(A20)", "si": "id1", "v": 2, "t": 2 } } } } ] }
//! ```
//!
//! Records with neither `f` nor `si` hold plain values and are not
//! formula cells; they are skipped on import.

use std::collections::BTreeMap;

use crate::cell::{CachedValue, CellError, CellValueType, ScalarValue};
use crate::error::Result;
use crate::shared::SharedId;
use crate::store::FormulaCell;
use crate::workbook::Workbook;
use crate::worksheet::Worksheet;

/// A persisted cached value (`v`)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RecordValue {
    /// `true` / `false`
    Boolean(bool),
    /// Any JSON number
    Number(f64),
    /// Text, or an error literal such as `#REF!`
    String(String),
}

impl From<&ScalarValue> for RecordValue {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Number(n) => RecordValue::Number(*n),
            ScalarValue::Boolean(b) => RecordValue::Boolean(*b),
            ScalarValue::String(s) => RecordValue::String(s.clone()),
            ScalarValue::Error(e) => RecordValue::String(e.as_str().to_string()),
        }
    }
}

impl From<RecordValue> for ScalarValue {
    fn from(value: RecordValue) -> Self {
        match value {
            RecordValue::Number(n) => ScalarValue::Number(n),
            RecordValue::Boolean(b) => ScalarValue::Boolean(b),
            RecordValue::String(s) => match CellError::from_str(&s) {
                Some(e) => ScalarValue::Error(e),
                None => ScalarValue::String(s),
            },
        }
    }
}

/// One persisted cell
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRecord {
    /// Formula text
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub f: Option<String>,
    /// Shared-group id
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub si: Option<String>,
    /// Cached value
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub v: Option<RecordValue>,
    /// Cached value type code
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub t: Option<u8>,
}

impl CellRecord {
    /// Build a record from a stored cell
    pub fn from_cell(cell: &FormulaCell) -> Self {
        Self {
            f: cell.text.clone(),
            si: cell.shared_id.as_ref().map(|id| id.as_str().to_string()),
            v: cell.cached.as_ref().map(|c| RecordValue::from(&c.value)),
            t: cell.cached.as_ref().and_then(|c| c.type_code),
        }
    }

    /// Convert to a stored cell; `None` for value-only records
    ///
    /// A type code without a value is dropped.
    pub fn to_cell(&self) -> Option<FormulaCell> {
        if self.f.is_none() && self.si.is_none() {
            return None;
        }
        if let Some(code) = self.t.filter(|&t| CellValueType::from_code(t).is_none()) {
            log::debug!("keeping unknown value type code {}", code);
        }
        Some(FormulaCell {
            text: self.f.clone(),
            shared_id: self.si.as_deref().map(SharedId::new),
            cached: self
                .v
                .clone()
                .map(|v| CachedValue::new(ScalarValue::from(v), self.t)),
        })
    }
}

/// One persisted sheet
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetRecord {
    /// Stable id
    pub id: String,
    /// Display name
    pub name: String,
    /// `row -> col -> record`
    #[cfg_attr(feature = "serde", serde(default))]
    pub cells: BTreeMap<u32, BTreeMap<u16, CellRecord>>,
}

impl SheetRecord {
    /// Snapshot a worksheet's formula cells
    pub fn from_worksheet(sheet: &Worksheet) -> Self {
        let mut cells: BTreeMap<u32, BTreeMap<u16, CellRecord>> = BTreeMap::new();
        for (row, col, cell) in sheet.formulas().iter() {
            cells
                .entry(row)
                .or_default()
                .insert(col, CellRecord::from_cell(cell));
        }
        Self {
            id: sheet.id().to_string(),
            name: sheet.name().to_string(),
            cells,
        }
    }

    /// Build a worksheet from this record
    pub fn to_worksheet(&self) -> Result<Worksheet> {
        let mut sheet = Worksheet::new(self.id.as_str(), self.name.as_str());
        for (&row, cols) in &self.cells {
            for (&col, record) in cols {
                if let Some(cell) = record.to_cell() {
                    sheet.put(row, col, cell)?;
                } else {
                    log::debug!("skipping value-only record at ({}, {})", row, col);
                }
            }
        }
        Ok(sheet)
    }
}

/// A persisted workbook: its sheets in order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkbookRecord {
    /// Sheets in tab order
    pub sheets: Vec<SheetRecord>,
}

impl WorkbookRecord {
    /// Build a workbook, validating sheet ids and names
    pub fn to_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::empty();
        for (index, sheet) in self.sheets.iter().enumerate() {
            workbook.insert_worksheet(index, sheet.to_worksheet()?)?;
        }
        Ok(workbook)
    }
}

impl From<&Workbook> for WorkbookRecord {
    fn from(workbook: &Workbook) -> Self {
        Self {
            sheets: workbook.worksheets().map(SheetRecord::from_worksheet).collect(),
        }
    }
}
