//! Keyword rule tables
//!
//! Every text heuristic in the analyzer is an ordered table of
//! `(label, keywords)` rows. Lookups are first-match-wins over substring
//! tests, so row order is part of the behaviour.

use crate::dependency::{DependencyType, FormulaCategory};
use crate::named_ranges::RangePurpose;
use crate::tables::TableContext;

/// One row of a rule table
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T> {
    pub label: T,
    pub keywords: &'static [&'static str],
}

const fn rule<T>(label: T, keywords: &'static [&'static str]) -> KeywordRule<T> {
    KeywordRule { label, keywords }
}

/// Label of the first row with a keyword contained in `text`
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    rules
        .iter()
        .find(|r| contains_any(text, r.keywords))
        .map(|r| r.label)
}

/// Whether `text` contains any of `keywords`
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

// === Tables ===

/// Tested against the lower-cased header text; `general` otherwise
pub const TABLE_CONTEXT_RULES: &[KeywordRule<TableContext>] = &[
    rule(
        TableContext::Financial,
        &["revenue", "cost", "profit", "cash", "balance", "income", "expense"],
    ),
    rule(
        TableContext::Operational,
        &["volume", "units", "quantity", "capacity", "production"],
    ),
    rule(
        TableContext::InputParameters,
        &["assumption", "input", "parameter", "rate", "factor"],
    ),
    rule(
        TableContext::OutputResults,
        &["result", "output", "summary", "total", "forecast"],
    ),
];

pub const INPUT_TABLE_KEYWORDS: &[&str] =
    &["input", "assumption", "parameter", "rate", "factor", "variable"];

pub const CALCULATION_TABLE_KEYWORDS: &[&str] =
    &["calculation", "calc", "formula", "computed", "derived"];

pub const OUTPUT_TABLE_KEYWORDS: &[&str] =
    &["output", "result", "summary", "total", "report", "dashboard"];

// === Formulas ===

/// Tested against the upper-cased formula, after the `!` check
pub const DEPENDENCY_TYPE_RULES: &[KeywordRule<DependencyType>] = &[
    rule(
        DependencyType::DataLookup,
        &["VLOOKUP", "INDEX", "MATCH", "XLOOKUP"],
    ),
    rule(
        DependencyType::Aggregation,
        &["SUM", "AVERAGE", "COUNT", "MAX", "MIN"],
    ),
    rule(DependencyType::ConditionalLogic, &["IF("]),
    rule(
        DependencyType::FinancialCalculation,
        &["NPV", "IRR", "PMT", "PV", "FV"],
    ),
];

/// Tested against the upper-cased formula, after the `!` check
pub const FORMULA_CATEGORY_RULES: &[KeywordRule<FormulaCategory>] = &[
    rule(
        FormulaCategory::Aggregation,
        &["SUM(", "AVERAGE(", "COUNT(", "MAX(", "MIN("],
    ),
    rule(FormulaCategory::ConditionalLogic, &["IF("]),
    rule(
        FormulaCategory::FinancialFunction,
        &["NPV(", "IRR(", "PMT(", "PV(", "FV("],
    ),
    rule(
        FormulaCategory::DataLookup,
        &["VLOOKUP(", "INDEX(", "MATCH(", "XLOOKUP("],
    ),
];

/// Notes attached to formula metadata; every matching row contributes
pub const IMPLEMENTATION_NOTE_RULES: &[KeywordRule<&str>] = &[
    rule("Requires database lookup functionality", &["VLOOKUP("]),
    rule(
        "Implement conditional logic with proper error handling",
        &["IF("],
    ),
    rule("Use efficient aggregation queries", &["SUM("]),
    rule("Requires cross-table/cross-module data access", &["!"]),
];

pub const DEFAULT_IMPLEMENTATION_NOTE: &str = "Standard calculation implementation";

/// Function tokens counted in the workbook summary, in presentation order
pub const FORMULA_PATTERN_TOKENS: &[&str] = &[
    "SUM(", "IF(", "VLOOKUP(", "INDEX(", "MATCH(", "NPV(", "IRR(",
];

// === Cells and names ===

/// Output dashboard titles, tested against lower-cased cell text
pub const DASHBOARD_KEYWORDS: &[&str] = &["summary", "dashboard", "report", "total", "analysis"];

/// Tested against the lower-cased defined name; `general` otherwise
pub const RANGE_PURPOSE_RULES: &[KeywordRule<RangePurpose>] = &[
    rule(RangePurpose::InputParameter, &["input", "param", "assumption"]),
    rule(
        RangePurpose::CalculationFactor,
        &["rate", "factor", "multiplier"],
    ),
    rule(RangePurpose::OutputValue, &["output", "result", "total"]),
    rule(RangePurpose::ScenarioControl, &["scenario", "case", "option"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_match_respects_row_order() {
        // "total cost" hits both financial and output; financial comes first
        assert_eq!(
            first_match(TABLE_CONTEXT_RULES, "total cost"),
            Some(TableContext::Financial)
        );
        assert_eq!(
            first_match(TABLE_CONTEXT_RULES, "units sold"),
            Some(TableContext::Operational)
        );
        assert_eq!(first_match(TABLE_CONTEXT_RULES, "name region"), None);
    }

    #[test]
    fn test_substring_semantics() {
        // keywords match inside words, as the tables are written
        assert!(contains_any("calculated margin", CALCULATION_TABLE_KEYWORDS));
        assert_eq!(
            first_match(RANGE_PURPOSE_RULES, "showcase_flag"),
            Some(RangePurpose::ScenarioControl)
        );
    }

    #[test]
    fn test_dependency_rows_are_uppercase_substrings() {
        assert_eq!(
            first_match(DEPENDENCY_TYPE_RULES, "=PV(B1,B2,B3)"),
            Some(DependencyType::FinancialCalculation)
        );
        assert_eq!(
            first_match(DEPENDENCY_TYPE_RULES, "=INDEX(A1:A9,MATCH(B1,C1:C9,0))"),
            Some(DependencyType::DataLookup)
        );
        assert_eq!(first_match(DEPENDENCY_TYPE_RULES, "=A1*2"), None);
    }

    #[test]
    fn test_every_table_is_lowercase_or_uppercase_consistently() {
        let lower = TABLE_CONTEXT_RULES
            .iter()
            .flat_map(|r| r.keywords)
            .chain(RANGE_PURPOSE_RULES.iter().flat_map(|r| r.keywords))
            .chain(DASHBOARD_KEYWORDS);
        for keyword in lower {
            assert_eq!(*keyword, keyword.to_lowercase());
        }
        let upper = DEPENDENCY_TYPE_RULES
            .iter()
            .flat_map(|r| r.keywords)
            .chain(FORMULA_CATEGORY_RULES.iter().flat_map(|r| r.keywords))
            .chain(FORMULA_PATTERN_TOKENS);
        for keyword in upper {
            assert_eq!(*keyword, keyword.to_uppercase());
        }
    }
}
