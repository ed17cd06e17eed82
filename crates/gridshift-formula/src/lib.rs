//! # gridshift-formula
//!
//! Reference-aware rewriting of spreadsheet formula text.
//!
//! This crate provides:
//! - The reference model ([`Reference`], [`SheetName`]) with exact text round-trip
//! - A token walker ([`ReferenceTokens`]) that finds references without building a tree
//! - Structural edit descriptors ([`StructuralEdit`]) and their syntactic inverses
//! - The transform resolver ([`ResolvedEdit`]) mapping references and cell positions
//! - Text splicing ([`rewrite_formula`]) and shared-formula derivation
//!   ([`derive_effective_text`])
//!
//! ## Example
//!
//! ```rust
//! use gridshift_core::SheetId;
//! use gridshift_formula::{rewrite_formula, ResolvedEdit, StructuralEdit};
//!
//! let sheet = SheetId::new("sheet1");
//! let edit = ResolvedEdit::new(
//!     StructuralEdit::InsertRows { sheet: sheet.clone(), at: 1, count: 1 },
//!     "Sheet1",
//! );
//! let text = rewrite_formula(&edit, "=SUM(A1:B2)", &sheet).unwrap();
//! assert_eq!(text.as_deref(), Some("=SUM(A1:B3)"));
//! ```

pub mod edit;
pub mod error;
pub mod reference;
pub mod rewrite;
pub mod shared;
pub mod tokens;
pub mod transform;

pub use edit::{Axis, StructuralEdit};
pub use error::{FormulaError, FormulaResult};
pub use reference::{Reference, SheetName};
pub use rewrite::{rewrite_formula, rewrite_references};
pub use shared::derive_effective_text;
pub use tokens::{tokenize, ReferenceToken, ReferenceTokens, TokenReference};
pub use transform::{ResolvedEdit, TransformedReference};
