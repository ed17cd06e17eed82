//! Prelude module - common imports for gridshift users
//!
//! ```rust
//! use gridshift::prelude::*;
//! ```

pub use crate::{
    CachedValue,
    CellAddress,
    CellError,
    CellRange,
    // Edit types
    EditOptions,
    EditStats,
    // Error types
    Error,
    FormulaCell,
    FormulaDataChanged,
    FormulaError,
    FormulaMutation,
    FormulaResult,
    MutationPair,
    Reference,
    Result,
    SheetId,
    StructuralEdit,
    // Main types
    Workbook,
    // Extension traits
    WorkbookEditExt,
    Worksheet,
};
