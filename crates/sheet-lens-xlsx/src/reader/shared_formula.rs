//! Shared formula expansion
//!
//! A block of identical formulas is stored once on its anchor cell
//! (`<f t="shared" si="0" ref="C2:C9">B2*2</f>`); the other cells only carry
//! `<f t="shared" si="0"/>`. Each dependent gets the anchor text with its
//! relative references moved by the row/column offset.

use lazy_regex::regex;
use sheet_lens_core::{CellAddress, MAX_COLS, MAX_ROWS};

/// Anchor of a shared formula group
#[derive(Debug, Clone)]
pub(crate) struct SharedFormula {
    pub row: u32,
    pub col: u16,
    /// Anchor text without the leading `=`
    pub text: String,
}

impl SharedFormula {
    /// Formula text for the cell at `(row, col)`
    pub fn translate_to(&self, row: u32, col: u16) -> String {
        let row_offset = i64::from(row) - i64::from(self.row);
        let col_offset = i64::from(col) - i64::from(self.col);
        shift_references(&self.text, row_offset, col_offset)
    }
}

/// Move every relative A1 reference in `formula` by the given offsets
///
/// String literals, function names (`LOG10(`) and sheet names (`Q1!`) are
/// left alone. A reference pushed off the grid becomes `#REF!`.
pub(crate) fn shift_references(formula: &str, row_offset: i64, col_offset: i64) -> String {
    if row_offset == 0 && col_offset == 0 {
        return formula.to_string();
    }

    let pattern = regex!(r#""[^"]*"|(\$?)([A-Za-z]{1,3})(\$?)([0-9]+)"#);
    pattern
        .replace_all(formula, |caps: &lazy_regex::regex::Captures<'_>| {
            let whole = &caps[0];
            if whole.starts_with('"') {
                return whole.to_string();
            }
            let Some(m) = caps.get(0) else {
                return whole.to_string();
            };
            let before = formula[..m.start()].chars().next_back();
            let after = formula[m.end()..].chars().next();
            let glued_before = before.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
            let glued_after =
                after.is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '(' | '!'));
            if glued_before || glued_after {
                return whole.to_string();
            }

            let col_absolute = !caps[1].is_empty();
            let row_absolute = !caps[3].is_empty();
            let (Ok(col), Ok(row)) = (
                CellAddress::letters_to_column(&caps[2]),
                caps[4].parse::<i64>(),
            ) else {
                return whole.to_string();
            };

            let new_col = if col_absolute {
                i64::from(col)
            } else {
                i64::from(col) + col_offset
            };
            // rows in the text are 1-based
            let new_row = if row_absolute { row } else { row + row_offset };
            if new_col < 0 || new_col >= i64::from(MAX_COLS) || new_row < 1 || new_row > i64::from(MAX_ROWS) {
                return "#REF!".to_string();
            }

            format!(
                "{}{}{}{}",
                &caps[1],
                CellAddress::column_to_letters(new_col as u16),
                &caps[3],
                new_row
            )
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_references_move() {
        assert_eq!(shift_references("B2*2", 3, 0), "B5*2");
        assert_eq!(shift_references("SUM(A1:B2)", 1, 1), "SUM(B2:C3)");
    }

    #[test]
    fn test_absolute_parts_stay() {
        assert_eq!(shift_references("$A$1+A$1+$A1", 2, 2), "$A$1+C$1+$A3");
    }

    #[test]
    fn test_literals_functions_and_sheet_names_untouched() {
        assert_eq!(
            shift_references("IF(Q1!A1>0,\"A1\",LOG10(A1))", 1, 0),
            "IF(Q1!A2>0,\"A1\",LOG10(A2))"
        );
    }

    #[test]
    fn test_off_grid_becomes_ref_error() {
        assert_eq!(shift_references("A1", -1, 0), "#REF!");
    }

    #[test]
    fn test_translate_from_anchor() {
        let shared = SharedFormula {
            row: 1,
            col: 2,
            text: "A2+B2".into(),
        };
        assert_eq!(shared.translate_to(4, 2), "A5+B5");
    }
}
