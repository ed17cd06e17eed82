//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1", "$B$2")
//! - [`CellRange`] - A rectangle of cells (e.g., "A1:B10")
//! - [`CellError`] - Spreadsheet error literals such as `#REF!`
//! - [`CachedValue`] - The last computed value of a formula cell

mod address;
mod value;

pub use address::{CellAddress, CellRange};
pub use value::{CachedValue, CellError, CellValueType, ScalarValue};
