//! Workbook type - the document root

use crate::error::{Error, Result};
use crate::named_range::{NamedRange, NamedRangeCollection};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook: ordered worksheets plus defined names
#[derive(Debug, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    named_ranges: NamedRangeCollection,
}

impl Workbook {
    /// Create a workbook holding one empty `Sheet1`
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("Sheet1")],
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Create a workbook with no worksheets (readers start here)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Iterate worksheets in tab order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append an empty worksheet, returning its index
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_existing_worksheet(Worksheet::new(name))
    }

    /// Append a worksheet built elsewhere (e.g., by a reader)
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    // === Defined Names ===

    pub fn named_ranges(&self) -> &NamedRangeCollection {
        &self.named_ranges
    }

    /// Add a defined name
    pub fn define_name(&mut self, name: NamedRange) -> Result<()> {
        self.named_ranges.define(name)
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| matches!(c, ':' | '\\' | '/' | '?' | '*' | '[' | ']')) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        // Excel compares sheet names case-insensitively
        let lower = name.to_lowercase();
        if self.worksheets.iter().any(|ws| ws.name().to_lowercase() == lower) {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_one_sheet() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert!(Workbook::empty().is_empty());
    }

    #[test]
    fn test_sheet_name_rules() {
        let mut wb = Workbook::new();
        assert!(wb.add_worksheet_with_name("Cash Flow").is_ok());
        assert!(matches!(
            wb.add_worksheet_with_name("SHEET1"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert!(wb.add_worksheet_with_name("Q1/Q2").is_err());
        assert!(wb.add_worksheet_with_name("").is_err());
        assert_eq!(wb.worksheet(1).map(|ws| ws.name()), Some("Cash Flow"));
    }

    #[test]
    fn test_define_name() {
        let mut wb = Workbook::new();
        wb.define_name(NamedRange::workbook_scope("Growth", "Sheet1!$B$2"))
            .unwrap();
        assert_eq!(wb.named_ranges().workbook_names().count(), 1);
    }
}
