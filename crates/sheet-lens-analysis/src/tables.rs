//! Table detection
//!
//! A sheet is scanned top to bottom. A row with more than one emphasized
//! cell (bold, or a visible fill) is a header row; it opens a table that runs
//! until the next header row or the end of the sheet.

use std::fmt;

use serde::Serialize;
use sheet_lens_core::{CellAddress, CellRange, Worksheet};

use crate::classify::{classify_at, SemanticType};
use crate::rules::{
    contains_any, first_match, CALCULATION_TABLE_KEYWORDS, INPUT_TABLE_KEYWORDS,
    OUTPUT_TABLE_KEYWORDS, TABLE_CONTEXT_RULES,
};

/// Minimum emphasized cells (exclusive) for a row to count as a header
const HEADER_THRESHOLD: usize = 1;

/// Business area a table's headers point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableContext {
    Financial,
    Operational,
    InputParameters,
    OutputResults,
    General,
}

impl TableContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableContext::Financial => "financial",
            TableContext::Operational => "operational",
            TableContext::InputParameters => "input_parameters",
            TableContext::OutputResults => "output_results",
            TableContext::General => "general",
        }
    }
}

impl fmt::Display for TableContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled block of rows
///
/// Rows and columns are 1-based, as a spreadsheet user reads them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    /// Header row to last row across the header columns, e.g. `A1:B10`
    pub range: String,
    pub headers: Vec<String>,
    pub types: Vec<SemanticType>,
    pub start_row: u32,
    pub start_col: u32,
    pub end_col: u32,
    pub row_count: u32,
    pub business_context: TableContext,
    pub is_input_table: bool,
    pub is_calculation_table: bool,
    pub is_output_table: bool,
}

impl Table {
    /// Last row covered by the table (1-based)
    pub fn end_row(&self) -> u32 {
        self.start_row + self.row_count.saturating_sub(1)
    }
}

/// Table whose row count is not known yet
struct OpenTable {
    /// 0-based header row
    header_row: u32,
    first_col: u16,
    last_col: u16,
    name: String,
    headers: Vec<String>,
    types: Vec<SemanticType>,
    business_context: TableContext,
}

impl OpenTable {
    /// Close after `last_row` (0-based, inclusive)
    fn close(self, last_row: u32) -> Table {
        let range = CellRange::from_indices(self.header_row, self.first_col, last_row, self.last_col);
        let header_text = self.headers.join(" ").to_lowercase();
        Table {
            name: self.name,
            range: format!(
                "{}:{}",
                range.start.to_relative_string(),
                range.end.to_relative_string()
            ),
            start_row: self.header_row + 1,
            start_col: u32::from(self.first_col) + 1,
            end_col: u32::from(self.last_col) + 1,
            row_count: last_row - self.header_row + 1,
            business_context: self.business_context,
            is_input_table: contains_any(&header_text, INPUT_TABLE_KEYWORDS),
            is_calculation_table: contains_any(&header_text, CALCULATION_TABLE_KEYWORDS),
            is_output_table: contains_any(&header_text, OUTPUT_TABLE_KEYWORDS),
            headers: self.headers,
            types: self.types,
        }
    }
}

/// Whether a cell is emphasized enough to be a header candidate
pub fn is_header_candidate(sheet: &Worksheet, row: u32, col: u16) -> bool {
    sheet
        .cell_style_at(row, col)
        .is_some_and(|style| style.font.bold || style.fill.is_visible())
}

/// Infer the business context from header cell texts
pub fn infer_table_context<'a>(texts: impl IntoIterator<Item = &'a str>) -> TableContext {
    let joined = texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    first_match(TABLE_CONTEXT_RULES, &joined).unwrap_or(TableContext::General)
}

/// Detect tables in row-scan order
pub fn detect_tables(sheet: &Worksheet) -> Vec<Table> {
    let Some(used) = sheet.used_range() else {
        return Vec::new();
    };
    let last_row = used.end.row;

    let mut tables = Vec::new();
    let mut open: Option<OpenTable> = None;

    for row in 0..=last_row {
        let candidates: Vec<u16> = sheet
            .iter_row(row)
            .map(|(col, _)| col)
            .filter(|&col| is_header_candidate(sheet, row, col))
            .collect();
        if candidates.len() <= HEADER_THRESHOLD {
            continue;
        }

        if let Some(table) = open.take() {
            tables.push(table.close(row - 1));
        }
        open = Some(open_table(sheet, row, &candidates, tables.len() + 1));
    }

    if let Some(table) = open {
        tables.push(table.close(last_row));
    }

    log::debug!("{}: {} table(s)", sheet.name(), tables.len());
    tables
}

fn open_table(sheet: &Worksheet, row: u32, candidates: &[u16], ordinal: usize) -> OpenTable {
    // candidates come from a row iterator, so they are sorted
    let first_col = candidates[0];
    let last_col = candidates[candidates.len() - 1];

    let mut headers = Vec::new();
    let mut types = Vec::new();
    for col in first_col..=last_col {
        let text = sheet.get_value_at(row, col).to_string();
        headers.push(if text.is_empty() {
            format!("Column_{}", CellAddress::column_to_letters(col))
        } else {
            text
        });
        types.push(classify_at(sheet, row, col));
    }

    let first_text = sheet.get_value_at(row, first_col).to_string();
    let name = if first_text.is_empty() {
        format!("Table_{}", ordinal)
    } else {
        first_text
    };

    let candidate_texts: Vec<String> = candidates
        .iter()
        .map(|&col| sheet.get_value_at(row, col).to_string())
        .collect();
    let business_context = infer_table_context(candidate_texts.iter().map(String::as_str));

    OpenTable {
        header_row: row,
        first_col,
        last_col,
        name,
        headers,
        types,
        business_context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheet_lens_core::Style;

    fn bold_row(sheet: &mut Worksheet, row: u32, labels: &[&str]) {
        for (col, label) in labels.iter().enumerate() {
            let col = col as u16;
            sheet.set_cell_value_at(row, col, *label).unwrap();
            sheet.set_cell_style_at(row, col, &Style::new().bold()).unwrap();
        }
    }

    fn fill_numbers(sheet: &mut Worksheet, rows: std::ops::RangeInclusive<u32>, cols: u16) {
        for row in rows {
            for col in 0..cols {
                sheet.set_cell_value_at(row, col, f64::from(row)).unwrap();
            }
        }
    }

    #[test]
    fn test_no_styling_no_tables() {
        let mut sheet = Worksheet::new("Plain");
        fill_numbers(&mut sheet, 0..=5, 3);
        assert!(detect_tables(&sheet).is_empty());
    }

    #[test]
    fn test_single_bold_cell_is_not_a_header() {
        let mut sheet = Worksheet::new("Title");
        bold_row(&mut sheet, 0, &["Quarterly Report"]);
        fill_numbers(&mut sheet, 1..=3, 2);
        assert!(detect_tables(&sheet).is_empty());
    }

    #[test]
    fn test_two_header_rows_split_the_sheet() {
        let mut sheet = Worksheet::new("Model");
        bold_row(&mut sheet, 0, &["Revenue", "Cost"]);
        fill_numbers(&mut sheet, 1..=3, 2);
        bold_row(&mut sheet, 4, &["Units", "Capacity", "Output"]);
        fill_numbers(&mut sheet, 5..=8, 3);

        let tables = detect_tables(&sheet);
        assert_eq!(tables.len(), 2);

        let first = &tables[0];
        assert_eq!(first.name, "Revenue");
        assert_eq!(first.range, "A1:B4");
        assert_eq!((first.start_row, first.row_count), (1, 4));
        assert_eq!(first.business_context, TableContext::Financial);

        let second = &tables[1];
        assert_eq!(second.range, "A5:C9");
        assert_eq!((second.start_row, second.row_count), (5, 5));
        assert_eq!(second.business_context, TableContext::Operational);
        assert!(second.is_output_table);

        // disjoint and contiguous
        assert_eq!(first.end_row() + 1, second.start_row);
    }

    #[test]
    fn test_headers_span_gaps_and_name_falls_back() {
        let mut sheet = Worksheet::new("Gaps");
        let bold = Style::new().bold();
        // B1 and D1 emphasized, C1 plain and empty, A1 untouched
        sheet.set_cell_style_at(0, 1, &bold).unwrap();
        sheet.set_cell_value_at(0, 3, "Rate").unwrap();
        sheet.set_cell_style_at(0, 3, &Style::new().fill_color("FFFFFF00")).unwrap();
        sheet.set_cell_value_at(1, 1, 0.5).unwrap();

        let tables = detect_tables(&sheet);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.name, "Table_1");
        assert_eq!(table.headers, vec!["Column_B", "Column_C", "Rate"]);
        assert_eq!(
            table.types,
            vec![SemanticType::Empty, SemanticType::Empty, SemanticType::Text]
        );
        assert_eq!((table.start_col, table.end_col), (2, 4));
        assert_eq!(table.business_context, TableContext::InputParameters);
        assert!(table.is_input_table);
    }

    #[test]
    fn test_placeholder_fill_does_not_count() {
        let mut sheet = Worksheet::new("Fill");
        let gray = Style {
            fill: sheet_lens_core::FillStyle::Pattern {
                pattern: "gray125".into(),
                color: None,
            },
            ..Style::default()
        };
        sheet.set_cell_value("A1", "x").unwrap();
        sheet.set_cell_value("B1", "y").unwrap();
        sheet.set_cell_style("A1", &gray).unwrap();
        sheet.set_cell_style("B1", &gray).unwrap();
        assert!(detect_tables(&sheet).is_empty());
    }

    #[test]
    fn test_context_uses_general_when_nothing_matches() {
        assert_eq!(infer_table_context(["Name", "Region"]), TableContext::General);
        assert_eq!(infer_table_context(["", "Forecast"]), TableContext::OutputResults);
    }
}
