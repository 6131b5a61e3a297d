//! Prelude module - common imports for sheet-lens users
//!
//! ```rust
//! use sheet_lens::prelude::*;
//! ```

pub use crate::{
    analyze_workbook,
    // Generation
    ChunkedAnalyzer,
    ChunkerConfig,
    GenerationConfig,
    TextGenerator,

    // Workbook model
    CellValue,
    Error,
    Result,
    Style,
    Workbook,
    Worksheet,

    // Analysis results
    SheetRecord,
    WorkbookAnalysis,
    WorkbookExt,
    WorkbookSummary,

    XlsxReader,
};
