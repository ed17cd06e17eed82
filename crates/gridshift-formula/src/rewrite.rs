//! Splicing transformed references back into formula text

use gridshift_core::{CellError, SheetId};

use crate::error::FormulaResult;
use crate::reference::Reference;
use crate::tokens::{ReferenceTokens, TokenReference};
use crate::transform::{ResolvedEdit, TransformedReference};

/// Rewrite every reference of `formula` through `f`
///
/// Replacements are spliced left to right into a new string, so earlier
/// replacements that change length never disturb later spans. `#REF!`
/// tokens are kept as they are. Returns `Ok(None)` when nothing changed,
/// including for text that is not a formula (no leading `=`).
pub fn rewrite_references<F>(formula: &str, mut f: F) -> FormulaResult<Option<String>>
where
    F: FnMut(&Reference) -> TransformedReference,
{
    if !formula.starts_with('=') {
        return Ok(None);
    }

    let mut out = String::with_capacity(formula.len());
    let mut copied = 0;
    let mut changed = false;
    for token in ReferenceTokens::new(formula) {
        let token = token?;
        let TokenReference::Valid(reference) = &token.reference else {
            continue;
        };
        let replacement = match f(reference) {
            TransformedReference::Unchanged => continue,
            TransformedReference::Shifted(new) => new.to_string(),
            TransformedReference::Invalidated => {
                log::trace!("reference {} invalidated", reference);
                CellError::Ref.as_str().to_string()
            }
        };
        if replacement == formula[token.span.clone()] {
            continue;
        }
        out.push_str(&formula[copied..token.span.start]);
        out.push_str(&replacement);
        copied = token.span.end;
        changed = true;
    }

    if !changed {
        return Ok(None);
    }
    out.push_str(&formula[copied..]);
    Ok(Some(out))
}

/// Apply a resolved edit to a formula held on sheet `context`
pub fn rewrite_formula(
    edit: &ResolvedEdit,
    formula: &str,
    context: &SheetId,
) -> FormulaResult<Option<String>> {
    rewrite_references(formula, |reference| edit.transform(reference, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::StructuralEdit;
    use pretty_assertions::assert_eq;

    fn sheet1() -> SheetId {
        SheetId::new("sheet1")
    }

    fn remove_row(at: u32) -> ResolvedEdit {
        ResolvedEdit::new(
            StructuralEdit::RemoveRows {
                sheet: sheet1(),
                at,
                count: 1,
            },
            "Sheet1",
        )
    }

    #[test]
    fn test_splices_in_place() {
        let edit = remove_row(8);
        assert_eq!(
            rewrite_formula(&edit, "=SUM(A8)+SUM(A9)*A10", &sheet1()).unwrap(),
            Some("=SUM(A8)+SUM(#REF!)*A9".to_string())
        );
    }

    #[test]
    fn test_length_changes_accumulate() {
        let edit = ResolvedEdit::new(
            StructuralEdit::InsertRows {
                sheet: sheet1(),
                at: 0,
                count: 991,
            },
            "Sheet1",
        );
        assert_eq!(
            rewrite_formula(&edit, "=A9+\"A1\"+B10", &sheet1()).unwrap(),
            Some("=A1000+\"A1\"+B1001".to_string())
        );
    }

    #[test]
    fn test_unchanged_returns_none() {
        let edit = remove_row(100);
        assert_eq!(rewrite_formula(&edit, "=SUM(A1:B2)", &sheet1()).unwrap(), None);
        assert_eq!(rewrite_formula(&edit, "=SUM(#REF!)", &sheet1()).unwrap(), None);
        assert_eq!(rewrite_formula(&edit, "CarNau", &sheet1()).unwrap(), None);
    }

    #[test]
    fn test_whole_qualified_token_invalidated() {
        let edit = ResolvedEdit::new(
            StructuralEdit::RemoveSheet {
                sheet: SheetId::new("sheet2"),
            },
            "Sheet2",
        );
        assert_eq!(
            rewrite_formula(&edit, "=Sheet2!A1:B2", &sheet1()).unwrap(),
            Some("=#REF!".to_string())
        );
        assert_eq!(
            rewrite_formula(&edit, "='Sheet2'!A1+A1", &sheet1()).unwrap(),
            Some("=#REF!+A1".to_string())
        );
    }

    #[test]
    fn test_untouched_spelling_survives() {
        let rename = ResolvedEdit::new(
            StructuralEdit::RenameSheet {
                sheet: SheetId::new("sheet2"),
                new_name: "Data".into(),
            },
            "Sheet2",
        );
        assert_eq!(
            rewrite_formula(&rename, "=sum(b2:a1)+sheet2!b2:a1", &sheet1()).unwrap(),
            Some("=sum(b2:a1)+Data!b2:a1".to_string())
        );

        // A shifted reference is written out normalized
        assert_eq!(
            rewrite_formula(&remove_row(0), "=b3:a2+c1:c1", &sheet1()).unwrap(),
            Some("=A1:B2+#REF!".to_string())
        );
    }

    #[test]
    fn test_malformed_is_an_error() {
        let edit = remove_row(0);
        assert!(rewrite_formula(&edit, "=\"unterminated", &sheet1()).is_err());
    }
}
