//! Data validation rules
//!
//! A validation restricts what a user may type into a range. For structural
//! analysis a validated cell is a user input, so the model keeps the rule
//! kind, its formulas and the prompt/error texts.
//!
//! ## Example
//!
//! ```rust
//! use sheet_lens_core::{CellRange, DataValidation};
//!
//! let rule = DataValidation::list("\"Low,Base,High\"")
//!     .with_range(CellRange::parse("B2:B4").unwrap())
//!     .with_input_message("Scenario", "Pick a case");
//!
//! assert!(rule.applies_to(2, 1));
//! assert_eq!(rule.kind.as_str(), "list");
//! ```

use crate::cell::CellRange;

/// A validation rule and the ranges it covers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValidation {
    pub kind: ValidationKind,
    pub operator: Option<ValidationOperator>,
    /// First formula/value (list source, lower bound, custom formula)
    pub formula1: Option<String>,
    /// Second formula/value (upper bound for between)
    pub formula2: Option<String>,
    pub ranges: Vec<CellRange>,
    pub allow_blank: bool,
    pub input_title: Option<String>,
    pub input_message: Option<String>,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
}

impl DataValidation {
    /// Create a rule of the given kind with no ranges
    pub fn new(kind: ValidationKind) -> Self {
        Self {
            kind,
            allow_blank: true,
            ..Self::default()
        }
    }

    /// Dropdown list; `source` is a quoted list or a range reference
    pub fn list(source: impl Into<String>) -> Self {
        Self::new(ValidationKind::List).with_formula1(source)
    }

    /// Whole-number rule with one bound
    pub fn whole_number(operator: ValidationOperator, value: impl Into<String>) -> Self {
        let mut rule = Self::new(ValidationKind::Whole).with_formula1(value);
        rule.operator = Some(operator);
        rule
    }

    /// Decimal rule with one bound
    pub fn decimal(operator: ValidationOperator, value: impl Into<String>) -> Self {
        let mut rule = Self::new(ValidationKind::Decimal).with_formula1(value);
        rule.operator = Some(operator);
        rule
    }

    /// Custom formula rule
    pub fn custom(formula: impl Into<String>) -> Self {
        Self::new(ValidationKind::Custom).with_formula1(formula)
    }

    pub fn with_formula1(mut self, formula: impl Into<String>) -> Self {
        self.formula1 = Some(formula.into());
        self
    }

    pub fn with_formula2(mut self, formula: impl Into<String>) -> Self {
        self.formula2 = Some(formula.into());
        self
    }

    pub fn with_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn with_input_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.input_title = Some(title.into());
        self.input_message = Some(message.into());
        self
    }

    pub fn with_error_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.error_title = Some(title.into());
        self.error_message = Some(message.into());
        self
    }

    /// Check whether this rule covers a 0-based cell position
    pub fn applies_to(&self, row: u32, col: u16) -> bool {
        self.ranges.iter().any(|range| range.contains(row, col))
    }

    /// Whether the rule actually restricts input (`none` rules only carry prompts)
    pub fn is_restrictive(&self) -> bool {
        self.kind != ValidationKind::None
    }
}

/// Rule kind, matching the `type` attribute of `<dataValidation>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationKind {
    /// Any value (prompt-only rule)
    #[default]
    None,
    Whole,
    Decimal,
    List,
    Date,
    Time,
    TextLength,
    Custom,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::None => "none",
            ValidationKind::Whole => "whole",
            ValidationKind::Decimal => "decimal",
            ValidationKind::List => "list",
            ValidationKind::Date => "date",
            ValidationKind::Time => "time",
            ValidationKind::TextLength => "textLength",
            ValidationKind::Custom => "custom",
        }
    }

    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "none" => Some(ValidationKind::None),
            "whole" => Some(ValidationKind::Whole),
            "decimal" => Some(ValidationKind::Decimal),
            "list" => Some(ValidationKind::List),
            "date" => Some(ValidationKind::Date),
            "time" => Some(ValidationKind::Time),
            "textLength" => Some(ValidationKind::TextLength),
            "custom" => Some(ValidationKind::Custom),
            _ => None,
        }
    }
}

/// Comparison operator for numeric/date/length rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ValidationOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOperator::Between => "between",
            ValidationOperator::NotBetween => "notBetween",
            ValidationOperator::Equal => "equal",
            ValidationOperator::NotEqual => "notEqual",
            ValidationOperator::GreaterThan => "greaterThan",
            ValidationOperator::LessThan => "lessThan",
            ValidationOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            ValidationOperator::LessThanOrEqual => "lessThanOrEqual",
        }
    }

    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "between" => Some(ValidationOperator::Between),
            "notBetween" => Some(ValidationOperator::NotBetween),
            "equal" => Some(ValidationOperator::Equal),
            "notEqual" => Some(ValidationOperator::NotEqual),
            "greaterThan" => Some(ValidationOperator::GreaterThan),
            "lessThan" => Some(ValidationOperator::LessThan),
            "greaterThanOrEqual" => Some(ValidationOperator::GreaterThanOrEqual),
            "lessThanOrEqual" => Some(ValidationOperator::LessThanOrEqual),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_to_any_range() {
        let rule = DataValidation::whole_number(ValidationOperator::GreaterThan, "0")
            .with_range(CellRange::parse("A1:A3").unwrap())
            .with_range(CellRange::parse("C5").unwrap());
        assert!(rule.applies_to(0, 0));
        assert!(rule.applies_to(4, 2));
        assert!(!rule.applies_to(3, 0));
        assert_eq!(rule.operator.map(|op| op.as_str()), Some("greaterThan"));
    }

    #[test]
    fn test_kind_round_trips_xlsx_token() {
        for kind in [ValidationKind::List, ValidationKind::TextLength, ValidationKind::Custom] {
            assert_eq!(ValidationKind::from_xlsx(kind.as_str()), Some(kind));
        }
        assert!(!DataValidation::new(ValidationKind::None).is_restrictive());
    }
}
