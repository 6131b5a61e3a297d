//! Workbook-level analysis pass

use sheet_lens_core::Workbook;

use crate::named_ranges::{extract_named_ranges, NamedRangeInfo};
use crate::record::{analyze_sheet, SheetRecord};
use crate::render;
use crate::summary::{summarize_records, WorkbookSummary};

/// Per-sheet records plus the workbook summary
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookAnalysis {
    pub sheets: Vec<SheetRecord>,
    pub named_ranges: Vec<NamedRangeInfo>,
    pub summary: WorkbookSummary,
}

impl WorkbookAnalysis {
    pub fn sheet(&self, name: &str) -> Option<&SheetRecord> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Every sheet page in one document, as sent to the text generator
    pub fn combined_markdown(&self, source: &str) -> String {
        render::combined_markdown(source, &self.sheets)
    }

    pub fn summary_markdown(&self) -> String {
        render::summary_markdown(&self.summary)
    }
}

/// Walks a workbook sheet by sheet
///
/// Named ranges are resolved once and shared by every sheet record.
pub struct WorkbookAnalyzer<'a> {
    workbook: &'a Workbook,
}

impl<'a> WorkbookAnalyzer<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        Self { workbook }
    }

    pub fn analyze(&self) -> WorkbookAnalysis {
        let named_ranges = extract_named_ranges(self.workbook);
        log::debug!(
            "analyzing {} sheet(s), {} named range destination(s)",
            self.workbook.sheet_count(),
            named_ranges.len()
        );

        let sheets: Vec<SheetRecord> = self
            .workbook
            .worksheets()
            .map(|sheet| analyze_sheet(sheet, &named_ranges))
            .collect();
        let summary = summarize_records(&sheets);

        WorkbookAnalysis {
            sheets,
            named_ranges,
            summary,
        }
    }
}

pub fn analyze_workbook(workbook: &Workbook) -> WorkbookAnalysis {
    WorkbookAnalyzer::new(workbook).analyze()
}
