//! # gridshift
//!
//! Structural edits for spreadsheet workbooks that keep formula references
//! correct and can always be undone.
//!
//! ## Features
//!
//! - Insert, remove and move rows or columns
//! - Move a rectangular range; insert or delete a range with shifting
//! - Rename or remove a sheet
//! - References invalidated by an edit become `#REF!`
//! - Shared formula groups are re-rooted, detached or dissolved as needed
//! - Every edit yields a forward and an inverse payload for undo/redo
//!
//! ## Example
//!
//! ```rust
//! use gridshift::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! workbook.add_worksheet("sheet2", "Sheet2").unwrap();
//! let sheet = workbook.worksheet_at_mut(0).unwrap();
//! sheet.set_formula("C15", "=Sheet2!A1:B2").unwrap();
//!
//! let edit = StructuralEdit::RenameSheet {
//!     sheet: SheetId::new("sheet2"),
//!     new_name: "Sheet2Rename".into(),
//! };
//! let (pair, _) = workbook.apply_edit(&edit).unwrap();
//! let text = workbook.worksheet_at(0).unwrap().formula("C15").unwrap().unwrap().text.clone();
//! assert_eq!(text.as_deref(), Some("=Sheet2Rename!A1:B2"));
//!
//! // Undo
//! workbook.apply_mutation(&pair.inverse).unwrap();
//! assert_eq!(workbook.worksheet_at(1).unwrap().name(), "Sheet2");
//! ```

pub mod mutation;
pub mod prelude;
pub mod structural;

// Re-export edit types
pub use mutation::{
    apply_mutation, CellPatch, EditStats, FormulaDataChanged, FormulaMutation, MutationPair, SheetOp,
};
pub use structural::{EditOptions, WorkbookEditExt};

// Re-export core types
pub use gridshift_core::{
    CachedValue,
    CellAddress,
    CellError,
    CellRange,
    CellRecord,
    CellValueType,
    // Error types
    Error,
    FormulaCell,
    FormulaStore,
    RecordValue,
    Result,
    ScalarValue,
    SharedGroup,
    SharedGroupIndex,
    SharedId,
    SheetId,
    SheetRecord,
    // Main types
    Workbook,
    WorkbookRecord,
    Worksheet,
};

// Re-export formula types
pub use gridshift_formula::{
    derive_effective_text, rewrite_formula, tokenize, Axis, FormulaError, FormulaResult, Reference,
    ReferenceToken, ResolvedEdit, SheetName, StructuralEdit, TokenReference, TransformedReference,
};
