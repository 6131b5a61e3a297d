//! Worksheet type

use std::collections::HashMap;

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::comment::CellComment;
use crate::error::{Error, Result};
use crate::style::{Style, StylePool};
use crate::validation::DataValidation;
use crate::{MAX_COLS, MAX_ROWS};

static EMPTY: CellValue = CellValue::Empty;

/// A cell a reader could not load, kept so analysis can report it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCell {
    /// A1 reference as written in the file (may itself be malformed)
    pub reference: String,
    pub reason: String,
}

/// One sheet: sparse cells plus the per-cell metadata read alongside them
#[derive(Debug)]
pub struct Worksheet {
    name: String,
    cells: CellStorage,
    /// Comments keyed by (row, col)
    comments: HashMap<(u32, u16), CellComment>,
    data_validations: Vec<DataValidation>,
    skipped_cells: Vec<SkippedCell>,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            comments: HashMap::new(),
            data_validations: Vec::new(),
            skipped_cells: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // === Cell Access ===

    /// Value at a position, `Empty` when nothing is stored there
    pub fn get_value_at(&self, row: u32, col: u16) -> &CellValue {
        self.cells
            .get(row, col)
            .map(|c| &c.value)
            .unwrap_or(&EMPTY)
    }

    /// Resolved style of a stored cell
    ///
    /// Returns `None` when no cell is stored at the position or its style
    /// index is not in the pool.
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        self.cells
            .get(row, col)
            .and_then(|c| self.cells.style_pool().get(c.style_index))
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by 0-based indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        Self::check_bounds(row, col)?;
        let value = match value.into() {
            CellValue::String(s) => CellValue::String(self.cells.string_pool_mut().intern(s)),
            other => other,
        };
        self.cells.set_value(row, col, value);
        Ok(())
    }

    /// Set a formula by address string; a leading `=` is added when missing
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::formula(formula))
    }

    /// Set a cell's style by address string
    pub fn set_cell_style(&mut self, address: &str, style: &Style) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_style_at(addr.row, addr.col, style)
    }

    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        Self::check_bounds(row, col)?;
        let index = self.cells.style_pool_mut().get_or_insert(style.clone());
        self.cells.set_style(row, col, index);
        Ok(())
    }

    /// Store a fully built cell (used by readers)
    pub fn set_cell_data_at(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        Self::check_bounds(row, col)?;
        self.cells.set(row, col, data);
        Ok(())
    }

    /// Register a style in this sheet's pool, returning its index
    pub fn intern_style(&mut self, style: Style) -> u32 {
        self.cells.style_pool_mut().get_or_insert(style)
    }

    pub fn style_pool(&self) -> &StylePool {
        self.cells.style_pool()
    }

    fn check_bounds(row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
        }
        Ok(())
    }

    // === Comments ===

    /// Attach a comment by address string
    pub fn set_comment(&mut self, address: &str, comment: CellComment) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_comment_at(addr.row, addr.col, comment)
    }

    pub fn set_comment_at(&mut self, row: u32, col: u16, comment: CellComment) -> Result<()> {
        Self::check_bounds(row, col)?;
        self.comments.insert((row, col), comment);
        Ok(())
    }

    pub fn comment_at(&self, row: u32, col: u16) -> Option<&CellComment> {
        self.comments.get(&(row, col))
    }

    // === Data Validation ===

    pub fn add_data_validation(&mut self, validation: DataValidation) {
        self.data_validations.push(validation);
    }

    pub fn data_validations(&self) -> &[DataValidation] {
        &self.data_validations
    }

    /// Rule covering a position, preferring one that restricts input
    pub fn data_validation_at(&self, row: u32, col: u16) -> Option<&DataValidation> {
        let mut covering = self
            .data_validations
            .iter()
            .filter(|v| v.applies_to(row, col));
        let first = covering.next()?;
        if first.is_restrictive() {
            return Some(first);
        }
        covering.find(|v| v.is_restrictive()).or(Some(first))
    }

    // === Read Diagnostics ===

    /// Note a cell that could not be loaded
    pub fn record_skipped_cell(&mut self, reference: impl Into<String>, reason: impl Into<String>) {
        self.skipped_cells.push(SkippedCell {
            reference: reference.into(),
            reason: reason.into(),
        });
    }

    pub fn skipped_cells(&self) -> &[SkippedCell] {
        &self.skipped_cells
    }

    // === Iteration ===

    /// Range spanning every stored cell
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(r0, c0, r1, c1)| CellRange::from_indices(r0, c0, r1, c1))
    }

    /// Extent from A1 to the last stored row and column
    ///
    /// This is the grid a row-by-row scan walks. Empty sheets yield `A1:A1`.
    pub fn grid_range(&self) -> CellRange {
        match self.cells.used_bounds() {
            Some((_, _, max_row, max_col)) => CellRange::from_indices(0, 0, max_row, max_col),
            None => CellRange::from_indices(0, 0, 0, 0),
        }
    }

    /// Dimensions string in `A1:D10` form
    pub fn dimensions(&self) -> String {
        match self.used_range() {
            Some(range) => format!(
                "{}:{}",
                range.start.to_relative_string(),
                range.end.to_relative_string()
            ),
            None => "A1:A1".to_string(),
        }
    }

    /// Iterate stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Iterate the stored cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter_row(row)
    }

    /// Iterate formula cells as `(row, col, formula_text)`
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.cells
            .iter()
            .filter_map(|(r, c, data)| data.value.formula_text().map(|f| (r, c, f)))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_read_values() {
        let mut sheet = Worksheet::new("Inputs");
        sheet.set_cell_value("B2", 0.05).unwrap();
        sheet.set_cell_formula("C2", "B2*2").unwrap();

        assert_eq!(sheet.get_value_at(1, 1).as_number(), Some(0.05));
        assert!(sheet.get_value_at(9, 9).is_empty());
        let formulas: Vec<_> = sheet.formula_cells().collect();
        assert_eq!(formulas, vec![(1, 2, "=B2*2")]);
    }

    #[test]
    fn test_style_resolution() {
        let mut sheet = Worksheet::new("S");
        sheet.set_cell_value("A1", "Revenue").unwrap();
        sheet.set_cell_style("A1", &Style::new().bold()).unwrap();

        assert!(sheet.cell_style_at(0, 0).unwrap().font.bold);
        assert!(sheet.cell_style_at(0, 1).is_none());
    }

    #[test]
    fn test_dimensions_and_grid() {
        let mut sheet = Worksheet::new("S");
        assert_eq!(sheet.dimensions(), "A1:A1");

        sheet.set_cell_value("C3", 1.0).unwrap();
        sheet.set_cell_value("E7", 2.0).unwrap();
        assert_eq!(sheet.dimensions(), "C3:E7");
        assert_eq!(sheet.grid_range().to_a1_string(), "A1:E7");
    }

    #[test]
    fn test_validation_lookup_prefers_restrictive_rule() {
        let mut sheet = Worksheet::new("S");
        let range = CellRange::parse("A1:A5").unwrap();
        sheet.add_data_validation(
            DataValidation::new(ValidationKind::None)
                .with_range(range)
                .with_input_message("Hint", "Type a number"),
        );
        sheet.add_data_validation(DataValidation::list("\"Yes,No\"").with_range(range));

        let rule = sheet.data_validation_at(2, 0).unwrap();
        assert_eq!(rule.kind, ValidationKind::List);
        assert!(sheet.data_validation_at(0, 1).is_none());
    }

    #[test]
    fn test_skipped_cells_are_kept_in_order() {
        let mut sheet = Worksheet::new("S");
        sheet.record_skipped_cell("B2", "shared string index 9 out of range");
        sheet.record_skipped_cell("ZZZZ1", "invalid reference");
        let refs: Vec<_> = sheet.skipped_cells().iter().map(|c| c.reference.as_str()).collect();
        assert_eq!(refs, vec!["B2", "ZZZZ1"]);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut sheet = Worksheet::new("S");
        assert!(sheet.set_cell_value_at(MAX_ROWS, 0, 1.0).is_err());
        assert!(sheet.set_comment_at(0, MAX_COLS, CellComment::text_only("x")).is_err());
    }
}
