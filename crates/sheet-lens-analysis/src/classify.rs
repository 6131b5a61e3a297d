//! Cell classification
//!
//! Infers a semantic type for one cell from its raw value and number format.

use std::fmt;

use serde::{Serialize, Serializer};
use sheet_lens_core::{CellValue, NumberFormat, Worksheet};

/// What a cell holds, as far as the heuristics are concerned
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Empty,
    Numeric,
    Date,
    Percentage,
    Currency,
    Formula,
    Boolean,
    Text,
    /// Storage type with no dedicated classification (`error`)
    Other(String),
}

impl SemanticType {
    pub fn as_str(&self) -> &str {
        match self {
            SemanticType::Empty => "empty",
            SemanticType::Numeric => "numeric",
            SemanticType::Date => "date",
            SemanticType::Percentage => "percentage",
            SemanticType::Currency => "currency",
            SemanticType::Formula => "formula",
            SemanticType::Boolean => "boolean",
            SemanticType::Text => "text",
            SemanticType::Other(token) => token,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SemanticType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classify a value given its number format
///
/// Rules apply in order: empty, then the numeric family (date, percentage,
/// currency, plain), then formula, boolean and text.
pub fn classify(value: &CellValue, format: &NumberFormat) -> SemanticType {
    match value {
        CellValue::Empty => SemanticType::Empty,
        CellValue::Number(_) if format.is_date_format() => SemanticType::Date,
        CellValue::Number(_) if format.is_percent() => SemanticType::Percentage,
        CellValue::Number(_) if format.has_currency_symbol() => SemanticType::Currency,
        CellValue::Number(_) => SemanticType::Numeric,
        CellValue::Formula { .. } => SemanticType::Formula,
        CellValue::Boolean(_) => SemanticType::Boolean,
        CellValue::String(_) => SemanticType::Text,
        other => SemanticType::Other(other.type_name().to_string()),
    }
}

/// Classify the cell at a 0-based position
pub fn classify_at(sheet: &Worksheet, row: u32, col: u16) -> SemanticType {
    let format = sheet
        .cell_style_at(row, col)
        .map(|style| &style.number_format);
    classify(
        sheet.get_value_at(row, col),
        format.unwrap_or(&NumberFormat::General),
    )
}
