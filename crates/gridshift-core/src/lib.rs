//! # gridshift-core
//!
//! Core data structures for the gridshift formula-rewriting library.
//!
//! This crate provides the types every other gridshift crate builds on:
//! - [`CellAddress`] and [`CellRange`] - A1 addressing with absolute markers
//! - [`FormulaCell`] and [`FormulaStore`] - the per-sheet formula data store
//! - [`SharedGroupIndex`] - the shared-formula relation (`si` groups)
//! - [`Worksheet`], [`Workbook`] - sheets keyed by a stable id plus a display name
//! - [`WorkbookRecord`] - the persisted `f` / `si` / `v` / `t` cell records
//!
//! ## Example
//!
//! ```rust
//! use gridshift_core::Workbook;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_at_mut(0).unwrap();
//!
//! sheet.set_formula("G1", "=A1:B2").unwrap();
//! sheet.set_shared_formula_at(19, 1, "=SUM(A20)", "id1").unwrap();
//! sheet.set_shared_member_at(20, 1, "id1").unwrap();
//!
//! assert_eq!(sheet.formula_count(), 3);
//! ```

pub mod cell;
pub mod error;
pub mod record;
pub mod shared;
pub mod store;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CachedValue, CellAddress, CellError, CellRange, CellValueType, ScalarValue};
pub use error::{Error, Result};
pub use record::{CellRecord, RecordValue, SheetRecord, WorkbookRecord};
pub use shared::{SharedGroup, SharedGroupIndex, SharedId};
pub use store::{FormulaCell, FormulaStore};
pub use workbook::Workbook;
pub use worksheet::{SheetId, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
