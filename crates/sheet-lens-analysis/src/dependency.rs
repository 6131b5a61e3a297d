//! Formula dependency extraction
//!
//! References are found with surface patterns over the formula text; the
//! formula language is never parsed. Two families are extracted:
//!
//! - local references: `B2`, `$B$2`, `B2:B10`
//! - cross-sheet references: `Rates!B2`, `'Q1 Plan'!$A$1:$C$4`
//!
//! ```rust
//! use sheet_lens_analysis::dependency::{extract, DependencyType};
//!
//! let dep = extract("C1", "=SUM(B2:B10)");
//! assert_eq!(dep.local_dependencies, vec!["B2:B10"]);
//! assert_eq!(dep.dependency_type, DependencyType::Aggregation);
//! assert_eq!(dep.complexity_score, 2);
//! ```

use std::fmt;

use lazy_regex::regex;
use serde::Serialize;
use sheet_lens_core::{CellAddress, Worksheet};

use crate::rules::{
    first_match, DEFAULT_IMPLEMENTATION_NOTE, DEPENDENCY_TYPE_RULES, FORMULA_CATEGORY_RULES,
    IMPLEMENTATION_NOTE_RULES,
};

/// Computational role of a formula, used for calculation planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    CrossSheetReference,
    DataLookup,
    Aggregation,
    ConditionalLogic,
    FinancialCalculation,
    SimpleCalculation,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::CrossSheetReference => "cross_sheet_reference",
            DependencyType::DataLookup => "data_lookup",
            DependencyType::Aggregation => "aggregation",
            DependencyType::ConditionalLogic => "conditional_logic",
            DependencyType::FinancialCalculation => "financial_calculation",
            DependencyType::SimpleCalculation => "simple_calculation",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formula bucket used for the per-sheet formula listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaCategory {
    ExternalReference,
    Aggregation,
    ConditionalLogic,
    FinancialFunction,
    DataLookup,
    Other,
}

impl FormulaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaCategory::ExternalReference => "external_reference",
            FormulaCategory::Aggregation => "aggregation",
            FormulaCategory::ConditionalLogic => "conditional_logic",
            FormulaCategory::FinancialFunction => "financial_function",
            FormulaCategory::DataLookup => "data_lookup",
            FormulaCategory::Other => "other",
        }
    }
}

impl fmt::Display for FormulaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference into another worksheet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SheetReference {
    /// Sheet name with any quoting removed
    pub sheet: String,
    /// Cell or range inside that sheet, `$` markers kept
    pub reference: String,
}

/// Dependency record for one formula cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaDependency {
    pub target_cell: String,
    pub formula: String,
    pub local_dependencies: Vec<String>,
    pub sheet_dependencies: Vec<SheetReference>,
    pub dependency_type: DependencyType,
    pub complexity_score: u32,
}

/// Formula text with quoted runs blanked out
///
/// String literals (`"..."`) are always blanked. Quoted sheet names
/// (`'...'`) are blanked when `sheet_names` is set. A doubled quote inside a
/// run closes and reopens it, so it stays blank.
fn blank_quoted(formula: &str, sheet_names: bool) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut open: Option<char> = None;

    for ch in formula.chars() {
        let quoted = match open {
            None if ch == '"' || ch == '\'' => {
                open = Some(ch);
                Some(ch)
            }
            Some(q) => {
                if ch == q {
                    open = None;
                }
                Some(q)
            }
            None => None,
        };
        let blank = match quoted {
            Some('"') => true,
            Some(_) => sheet_names,
            None => false,
        };
        if blank {
            out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Local reference tokens in order of appearance
///
/// String literals and sheet names are not references: a token followed by
/// `!` or `'!` is dropped, and quoted text is never matched.
pub fn local_references(formula: &str) -> Vec<String> {
    let pattern = regex!(r"\$?[A-Za-z]+\$?[0-9]+(?::\$?[A-Za-z]+\$?[0-9]+)?");
    let text = blank_quoted(formula, true);
    pattern
        .find_iter(&text)
        .filter(|m| {
            let rest = &text[m.end()..];
            !(rest.starts_with('!') || rest.starts_with("'!"))
        })
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `(sheet, reference)` pairs in order of appearance
///
/// Whole-column and whole-row references (`Data!B:B`) carry no cell token
/// and are not reported. Text inside string literals is ignored.
pub fn sheet_references(formula: &str) -> Vec<SheetReference> {
    let pattern = regex!(
        r"(?:'((?:[^']|'')+)'|([A-Za-z0-9_.]+))!(\$?[A-Za-z]+\$?[0-9]+(?::\$?[A-Za-z]+\$?[0-9]+)?)"
    );
    let text = blank_quoted(formula, false);
    pattern
        .captures_iter(&text)
        .filter_map(|caps| {
            let sheet = match (caps.get(1), caps.get(2)) {
                (Some(quoted), _) => quoted.as_str().replace("''", "'"),
                (None, Some(bare)) => bare.as_str().to_string(),
                (None, None) => return None,
            };
            Some(SheetReference {
                sheet,
                reference: caps.get(3)?.as_str().to_string(),
            })
        })
        .collect()
}

/// Classify a formula's computational role
///
/// A cross-sheet marker wins over everything else, then lookup, aggregation,
/// conditional and financial keywords in that order.
pub fn classify_dependency(formula: &str) -> DependencyType {
    if formula.contains('!') {
        return DependencyType::CrossSheetReference;
    }
    first_match(DEPENDENCY_TYPE_RULES, &formula.to_uppercase())
        .unwrap_or(DependencyType::SimpleCalculation)
}

/// Bucket a formula for the per-sheet listing
pub fn categorize_formula(formula: &str) -> FormulaCategory {
    let upper = formula.to_uppercase();
    if upper.contains('!') {
        return FormulaCategory::ExternalReference;
    }
    first_match(FORMULA_CATEGORY_RULES, &upper).unwrap_or(FormulaCategory::Other)
}

/// Additive complexity estimate
///
/// One point per `(` and per `!`, two per literal `IF`, and one per local
/// reference token (a range is one token).
pub fn complexity_score(formula: &str) -> u32 {
    let parens = formula.matches('(').count();
    let sheets = formula.matches('!').count();
    let conditionals = formula.matches("IF").count();
    let references = local_references(formula).len();
    (parens + sheets + 2 * conditionals + references) as u32
}

/// Implementation hints for a formula, joined with `; `
pub fn implementation_notes(formula: &str) -> String {
    let upper = formula.to_uppercase();
    let notes: Vec<&str> = IMPLEMENTATION_NOTE_RULES
        .iter()
        .filter(|r| r.keywords.iter().any(|k| upper.contains(k)))
        .map(|r| r.label)
        .collect();
    if notes.is_empty() {
        DEFAULT_IMPLEMENTATION_NOTE.to_string()
    } else {
        notes.join("; ")
    }
}

/// Build the dependency record for one formula
pub fn extract(target_cell: &str, formula: &str) -> FormulaDependency {
    FormulaDependency {
        target_cell: target_cell.to_string(),
        formula: formula.to_string(),
        local_dependencies: local_references(formula),
        sheet_dependencies: sheet_references(formula),
        dependency_type: classify_dependency(formula),
        complexity_score: complexity_score(formula),
    }
}

/// One record per formula cell, in row-major order
pub fn extract_dependencies(sheet: &Worksheet) -> Vec<FormulaDependency> {
    sheet
        .formula_cells()
        .filter(|(_, _, formula)| !formula.is_empty())
        .map(|(row, col, formula)| extract(&CellAddress::new(row, col).to_a1_string(), formula))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet_ref(sheet: &str, reference: &str) -> SheetReference {
        SheetReference {
            sheet: sheet.into(),
            reference: reference.into(),
        }
    }

    #[test]
    fn test_local_references() {
        assert_eq!(
            local_references("=A1+$B$2*SUM(C3:C10)"),
            vec!["A1", "$B$2", "C3:C10"]
        );
        // sheet prefix is not a reference; the cell after it is
        assert_eq!(local_references("=Q1!B2+C2"), vec!["B2", "C2"]);
        assert!(local_references("=TRUE").is_empty());
    }

    #[test]
    fn test_quoted_sheet_name_is_not_a_reference() {
        assert_eq!(local_references("=FY2024!B2"), vec!["B2"]);
        assert_eq!(local_references("='FY2024'!B2"), vec!["B2"]);
        assert_eq!(local_references("='Q1 Plan'!A1+C2"), vec!["A1", "C2"]);
        assert_eq!(complexity_score("=FY2024!B2"), 2);
        assert_eq!(complexity_score("='FY2024'!B2"), 2);
    }

    #[test]
    fn test_string_literals_are_ignored() {
        assert_eq!(local_references("=IF(A1=\"Q1\",1,0)"), vec!["A1"]);
        assert_eq!(local_references("=\"say \"\"B2\"\"\"&C3"), vec!["C3"]);
        assert_eq!(
            sheet_references("=\"Data!A1\"&'It''s \"Q1\"'!B2"),
            vec![sheet_ref("It's \"Q1\"", "B2")]
        );
    }

    #[test]
    fn test_sheet_references() {
        assert_eq!(
            sheet_references("=Rates!$B$2*'Q1 Plan'!A1:C4+'Bob''s'!D5"),
            vec![
                sheet_ref("Rates", "$B$2"),
                sheet_ref("Q1 Plan", "A1:C4"),
                sheet_ref("Bob's", "D5"),
            ]
        );
        assert!(sheet_references("=SUM(Data!B:B)").is_empty());
    }

    #[test]
    fn test_cross_sheet_wins_over_lookup() {
        assert_eq!(
            classify_dependency("=VLOOKUP(A1,Sheet2!B:B,2,FALSE)"),
            DependencyType::CrossSheetReference
        );
    }

    #[test]
    fn test_dependency_precedence() {
        assert_eq!(classify_dependency("=vlookup(A1,B:C,2,0)"), DependencyType::DataLookup);
        assert_eq!(classify_dependency("=SUMIF(A:A,\"x\",B:B)"), DependencyType::Aggregation);
        assert_eq!(classify_dependency("=IF(A1>0,1,0)"), DependencyType::ConditionalLogic);
        assert_eq!(classify_dependency("=NPV(0.1,B2:B9)"), DependencyType::FinancialCalculation);
        assert_eq!(classify_dependency("=A1*B1"), DependencyType::SimpleCalculation);
    }

    #[test]
    fn test_formula_categories() {
        assert_eq!(categorize_formula("=Inputs!B2*2"), FormulaCategory::ExternalReference);
        assert_eq!(categorize_formula("=sum(A1:A3)"), FormulaCategory::Aggregation);
        assert_eq!(categorize_formula("=IF(A1,1,2)"), FormulaCategory::ConditionalLogic);
        assert_eq!(categorize_formula("=PMT(B1,B2,B3)"), FormulaCategory::FinancialFunction);
        assert_eq!(categorize_formula("=XLOOKUP(A1,B:B,C:C)"), FormulaCategory::DataLookup);
        // aggregation is tested before lookup
        assert_eq!(
            categorize_formula("=INDEX(A1:A9,MATCH(MAX(B1:B9),B1:B9,0))"),
            FormulaCategory::Aggregation
        );
        assert_eq!(categorize_formula("=A1&B1"), FormulaCategory::Other);
    }

    #[test]
    fn test_complexity_score() {
        assert_eq!(complexity_score("=SUM(B2:B10)"), 2);
        // ( ( ! IF IF refs: A1 B1 C1
        assert_eq!(complexity_score("=IF(A1>0,Data!B1,IF(C1,1,0))"), 2 + 1 + 4 + 3);
        assert_eq!(complexity_score("=1+2"), 0);
    }

    #[test]
    fn test_implementation_notes() {
        assert_eq!(
            implementation_notes("=IF(SUM(A1:A3)>0,Data!B1,0)"),
            "Implement conditional logic with proper error handling; \
             Use efficient aggregation queries; \
             Requires cross-table/cross-module data access"
        );
        assert_eq!(implementation_notes("=A1*2"), "Standard calculation implementation");
    }

    #[test]
    fn test_extract_dependencies_in_row_major_order() {
        let mut sheet = Worksheet::new("Calc");
        sheet.set_cell_formula("B2", "A2*2").unwrap();
        sheet.set_cell_formula("A1", "SUM(B2:B3)").unwrap();
        sheet.set_cell_value("C1", 5.0).unwrap();

        let deps = extract_dependencies(&sheet);
        let targets: Vec<_> = deps.iter().map(|d| d.target_cell.as_str()).collect();
        assert_eq!(targets, vec!["A1", "B2"]);
        assert_eq!(deps[1].formula, "=A2*2");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(extract("C1", "=Rates!B2*2")).unwrap();
        assert_eq!(json["dependency_type"], "cross_sheet_reference");
        assert_eq!(json["sheet_dependencies"][0]["sheet"], "Rates");
    }
}
