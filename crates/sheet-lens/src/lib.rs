//! # sheet-lens
//!
//! Reads Excel workbooks and explains their structure.
//!
//! For every worksheet sheet-lens finds the header-driven tables, the
//! formula dependencies, the input cells, calculation zones and output
//! areas, and the software requirements they imply. The results serialize
//! to JSON and render to markdown, and the markdown can be fed in
//! token-bounded chunks to a text generator.
//!
//! ## Features
//!
//! - Read XLSX and XLSM files (Office Open XML)
//! - Per-cell semantic types and business context
//! - Table, dependency and named-range detection
//! - Workbook summary with a complexity rating
//! - Chunked report and requirements-document generation behind a trait
//!
//! ## Example
//!
//! ```rust
//! use sheet_lens::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "Units").unwrap();
//! sheet.set_cell_value("A2", 40.0).unwrap();
//! sheet.set_cell_formula("B2", "A2*1.2").unwrap();
//!
//! let analysis = analyze_workbook(&workbook);
//! assert_eq!(analysis.summary.total_formulas(), 1);
//!
//! // let workbook = Workbook::open("model.xlsx").unwrap();
//! ```

pub mod prelude;

pub use sheet_lens_core::{
    CellAddress,
    CellComment,
    CellData,
    CellError,
    CellRange,
    CellValue,
    DataValidation,
    Error,
    FillStyle,
    FontStyle,
    NameScope,
    NamedRange,
    NumberFormat,
    Result,
    Style,
    ValidationKind,
    ValidationOperator,
    Workbook,
    Worksheet,

    MAX_COLS,
    MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

pub use sheet_lens_xlsx::{XlsxError, XlsxReader};

pub use sheet_lens_analysis::{
    analyze_sheet, analyze_workbook, chunk, classify, dependency, generate, named_ranges,
    patterns, record, render, rules, summary, tables, AnalysisError, AnalysisResult,
    ApproximateTokenCounter, ChunkedAnalyzer, ChunkerConfig, ComplexityRating, GeneratedDocument,
    GenerationConfig, GenerationError, SheetRecord, TextChunk, TextGenerator, TokenCounter,
    WorkbookAnalysis, WorkbookAnalyzer, WorkbookContext, WorkbookSummary,
};

use std::path::Path;

/// Extension trait for Workbook to add file input
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => XlsxReader::read_file(path)
                .map_err(|e| Error::other(format!("{}: {}", path.display(), e))),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

/// Whether `path` names a workbook [`WorkbookExt::open`] can read
pub fn is_supported(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    // Excel lock files
    if name.starts_with("~$") {
        return false;
    }
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("xlsx") | Some("xlsm")
    )
}
